//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value with any inline comment removed; typed parsing and its
    /// errors belong to the caller.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// All `key = value` pairs of a section in file order; empty when the
    /// section is absent.
    fn section_entries(&self, section: &str) -> Vec<(String, String)>;
}
