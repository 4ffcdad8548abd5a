use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    None,
    Int(i64),
    UInt(u64),
    String(String),
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::None => write!(f, "ok"),
            Val::Int(v) => write!(f, "{}", v),
            Val::UInt(v) => write!(f, "{}", v),
            Val::String(s) => f.write_str(s),
        }
    }
}
