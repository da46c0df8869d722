//! Configuration access port trait.
//!
//! Values are returned raw; typed parsing lives in `config_validation`.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn has_section(&self, section: &str) -> bool;
}
