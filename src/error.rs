#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("{name} must be greater than 0")]
    ZeroValue { name: &'static str },

    #[error("{name} ({value}) must be in range {range}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("min_window ({min_window}) is greater than max_window ({max_window})")]
    MinWindowAboveMax { min_window: u32, max_window: u32 },

    #[error(
        "max window decrease per epoch ({decrease}) is lower than max increase per epoch ({increase}), shrinking must be at least as fast as growing"
    )]
    DecreaseSlowerThanIncrease { increase: u32, decrease: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
