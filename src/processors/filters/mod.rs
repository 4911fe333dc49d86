use tera::Tera;
mod markdown;
mod urlize;

pub fn register_all(tera: &mut Tera) {
    tera_text_filters::register_all(tera);
    tera.register_filter("markdown", markdown::Markdown);
    tera.register_filter("urlize", urlize::Urlize);
}
