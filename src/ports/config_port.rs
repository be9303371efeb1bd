//! Configuration access port.
//!
//! Values come back as raw strings; typed parsing and range checks live in
//! [`crate::domain::config_validation`] so every source reports errors the
//! same way.

pub trait ConfigPort {
    /// Raw value for `key` in `section`, or `None` when absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Names of every section present in the source.
    fn sections(&self) -> Vec<String>;
}
