pub mod mysql;
pub mod static_loader;

#[must_use]
pub fn adapter_name() -> &'static str {
    "dbnav-adapters"
}

#[cfg(test)]
mod tests {
    use super::adapter_name;

    #[test]
    fn adapter_name_is_stable() {
        assert_eq!(adapter_name(), "dbnav-adapters");
    }
}
