use std::fmt;

/// Namespace URI reserved for `xmlns:prefix="..."` declarations.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
/// Namespace URI bound to the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl XName {
    pub fn new(namespace: &str, local_name: &str) -> Self {
        Self {
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace.to_string())
            },
            local_name: local_name.to_string(),
        }
    }

    pub fn local(local_name: &str) -> Self {
        Self {
            namespace: None,
            local_name: local_name.to_string(),
        }
    }

    /// Name of a namespace declaration attribute (`xmlns:prefix`, or `xmlns`
    /// for the default namespace when `prefix` is empty).
    pub fn xmlns(prefix: &str) -> Self {
        if prefix.is_empty() {
            Self::local("xmlns")
        } else {
            Self::new(XMLNS_NS, prefix)
        }
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    pub fn is_namespace_declaration(&self) -> bool {
        (self.namespace.is_none() && self.local_name == "xmlns") || self.in_namespace(XMLNS_NS)
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XAttribute {
    pub name: XName,
    pub value: String,
}

impl XAttribute {
    pub fn new(name: XName, value: &str) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }

    /// Prefix declared by this attribute, if it is a namespace declaration.
    pub fn declared_prefix(&self) -> Option<&str> {
        if !self.name.is_namespace_declaration() {
            return None;
        }
        if self.name.namespace.is_none() {
            Some("")
        } else {
            Some(self.name.local_name.as_str())
        }
    }
}
