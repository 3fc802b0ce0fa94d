//! Currency handling. The platform currently operates in Kenyan Shillings
//! only, but the wire format keeps the code explicit.

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Kes,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Self::Kes => "KES",
        }
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "KES" => Ok(Self::Kes),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid currency: {other}"
            ))),
        }
    }
}
