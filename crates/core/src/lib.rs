pub mod cursor;
pub mod explorer;
pub mod loader;
pub mod node;
pub mod path;
pub mod registry;
pub mod search;
pub mod settings;
pub mod tree;
pub mod viewport;

#[cfg(test)]
mod test_support;

#[must_use]
pub fn domain_name() -> &'static str {
    "dbnav-core"
}
