use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level failures; the interesting detail lives in the child error.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("no usable converter")]
    Converter,
    #[display("run did not complete")]
    Run,
    #[display("could not run script")]
    Script,
}
