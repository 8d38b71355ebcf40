//! Shared plumbing for the account service crates: logging setup and
//! small wire types.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::ok();
        assert_eq!(h.status, "ok");
    }
}
