use tera::{try_get_value, Filter};

use crate::data::url::urlize;

/// the slug a term or title gets in urls
pub struct Urlize;

impl Filter for Urlize {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &std::collections::HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let string_content = try_get_value!("urlize", "value", String, value);

        Ok(tera::Value::String(urlize(&string_content)))
    }
}
