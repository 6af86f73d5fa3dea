//! Prismic query predicates

/// `[[at(path,"value")]]`
pub fn at(path: &str, value: &str) -> String {
    format!("[[at({},\"{}\")]]", path, escape(value))
}

/// Match documents of a custom type
pub fn document_type(document_type: &str) -> String {
    at("document.type", document_type)
}

/// Match a document of a custom type by UID
pub fn uid(document_type: &str, uid: &str) -> String {
    at(&format!("my.{}.uid", document_type), uid)
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
