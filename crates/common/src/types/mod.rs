use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Self { status: "ok", version: env!("CARGO_PKG_VERSION") }
    }
}
