//! Pipeline description languages. YAML is the only one for now.

pub mod yaml;
