//! 类型名称
//!
//! 容器中的所有注册表都以类型名称为键。名称使用 Rust 路径风格的 `::`
//! 作为命名空间分隔符，例如 `app::logging::LoggerInterface`。

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// 命名空间分隔符
pub const NAMESPACE_SEPARATOR: &str = "::";

/// 类或接口的完全限定名称
///
/// 内部使用 `Arc<str>`，克隆开销很小，可以放心地在注册表之间传递。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 去掉一个前导的命名空间分隔符
    ///
    /// `::app::Foo` 与 `app::Foo` 指向同一个类型。
    pub fn normalized(&self) -> TypeName {
        match self.0.strip_prefix(NAMESPACE_SEPARATOR) {
            Some(stripped) => TypeName::new(stripped),
            None => self.clone(),
        }
    }

    /// 拆分为命名空间前缀（包含结尾的分隔符）和基础标识符
    pub fn split_namespace(&self) -> (&str, &str) {
        match self.0.rfind(NAMESPACE_SEPARATOR) {
            Some(pos) => self.0.split_at(pos + NAMESPACE_SEPARATOR.len()),
            None => ("", &self.0),
        }
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for TypeName {
    fn from(name: &String) -> Self {
        TypeName::new(name)
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}
