//! 实例与参数值
//!
//! - [`Object`]：容器构造出的实例，记录具体类名，并可转换为已注册的接口
//! - [`Value`]：位置参数，可以是实例、任意原始值或空值
//! - [`Arguments`]：交给构造函数的、已经解析完成的参数列表

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::ContainerError;
use crate::reflect::TypeName;

pub(crate) type SharedAny = Arc<dyn Any + Send + Sync>;

type Caster = Arc<dyn Fn(SharedAny) -> Option<Box<dyn Any>> + Send + Sync>;

/// 类型转换表
///
/// 以 `TypeId::of::<Arc<U>>()` 为键，把具体实例转换为 `Arc<U>`（`U` 可以是 trait 对象）。
#[derive(Default)]
pub(crate) struct CastTable {
    casters: HashMap<TypeId, Caster>,
}

impl CastTable {
    /// 注册从具体类型 `T` 到 `Arc<U>` 的转换
    pub(crate) fn insert<T, U, F>(&mut self, upcast: F)
    where
        T: Any + Send + Sync,
        U: ?Sized + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        let caster: Caster = Arc::new(move |value: SharedAny| {
            value
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(upcast(concrete)) as Box<dyn Any>)
        });
        self.casters.insert(TypeId::of::<Arc<U>>(), caster);
    }

    fn cast<U: ?Sized + 'static>(&self, value: &SharedAny) -> Option<Arc<U>> {
        let caster = self.casters.get(&TypeId::of::<Arc<U>>())?;
        caster(Arc::clone(value))
            .and_then(|boxed| boxed.downcast::<Arc<U>>().ok())
            .map(|arc| *arc)
    }
}

/// 容器管理的实例
///
/// 克隆只增加引用计数，所有克隆指向同一个实例。
#[derive(Clone)]
pub struct Object {
    class: TypeName,
    value: SharedAny,
    casts: Arc<CastTable>,
}

impl Object {
    pub(crate) fn new(class: TypeName, value: SharedAny, casts: Arc<CastTable>) -> Self {
        Self { class, value, casts }
    }

    /// 实例的具体类名
    pub fn class(&self) -> &TypeName {
        &self.class
    }

    /// 转换为具体类型或该类声明实现的接口
    ///
    /// ```ignore
    /// let logger: Arc<dyn Logger> = object.cast::<dyn Logger>().unwrap();
    /// ```
    pub fn cast<U: ?Sized + 'static>(&self) -> Option<Arc<U>> {
        self.casts.cast::<U>(&self.value)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// 两个句柄是否指向同一个实例
    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class)
            .field("ptr", &Arc::as_ptr(&self.value).cast::<()>())
            .finish()
    }
}

/// 位置参数
#[derive(Clone, Default)]
pub enum Value {
    /// 空值，可选参数缺省时使用
    #[default]
    Null,
    /// 容器实例，可以满足带类型要求的参数
    Object(Object),
    /// 任意原始值，只能满足无类型要求的参数
    Raw(SharedAny),
}

impl Value {
    pub fn raw<T: Any + Send + Sync>(value: T) -> Self {
        Value::Raw(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// 读取原始值
    pub fn raw_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Raw(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Object(_) => "object",
            Value::Raw(_) => "raw value",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Object(object) => f.debug_tuple("Object").field(object.class()).finish(),
            Value::Raw(_) => f.write_str("Raw(..)"),
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<&Object> for Value {
    fn from(object: &Object) -> Self {
        Value::Object(object.clone())
    }
}

impl From<Option<Object>> for Value {
    fn from(object: Option<Object>) -> Self {
        object.map_or(Value::Null, Value::Object)
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::raw(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::raw(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::raw(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::raw(value)
    }
}

/// 构建位置参数列表
///
/// ```ignore
/// let instance = container.create_with("app::Mailer", args![transport, "smtp.local"])?;
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Value::from($value)),+]
    };
}

/// 交给类构造函数的参数列表
///
/// 参数已按构造函数声明的顺序解析完成，构造函数按顺序逐个取出。
pub struct Arguments {
    class: TypeName,
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(class: TypeName, values: Vec<Value>) -> Self {
        Self {
            class,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// 剩余参数个数
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// 取出下一个参数，不做任何检查；参数用尽时返回 `Value::Null`
    pub fn value(&mut self) -> Value {
        self.position += 1;
        self.values.next().unwrap_or_default()
    }

    /// 取出下一个必需的实例参数
    pub fn object<U: ?Sized + 'static>(&mut self) -> Result<Arc<U>, ContainerError> {
        self.optional_object::<U>()?
            .ok_or_else(|| self.mismatch(std::any::type_name::<U>()))
    }

    /// 取出下一个可选的实例参数
    pub fn optional_object<U: ?Sized + 'static>(&mut self) -> Result<Option<Arc<U>>, ContainerError> {
        match self.value() {
            Value::Null => Ok(None),
            Value::Object(object) => object
                .cast::<U>()
                .map(Some)
                .ok_or_else(|| self.mismatch(std::any::type_name::<U>())),
            Value::Raw(_) => Err(self.mismatch(std::any::type_name::<U>())),
        }
    }

    /// 取出下一个必需的原始值
    pub fn raw<T: Any + Clone>(&mut self) -> Result<T, ContainerError> {
        self.optional_raw::<T>()?
            .ok_or_else(|| self.mismatch(std::any::type_name::<T>()))
    }

    /// 取出下一个可选的原始值
    pub fn optional_raw<T: Any + Clone>(&mut self) -> Result<Option<T>, ContainerError> {
        let value = self.value();
        if value.is_null() {
            return Ok(None);
        }
        match value.raw_ref::<T>() {
            Some(raw) => Ok(Some(raw.clone())),
            None => {
                tracing::debug!(
                    "Argument #{} for \"{}\" is a {}, not {}",
                    self.position,
                    self.class,
                    value.kind(),
                    std::any::type_name::<T>()
                );
                Err(self.mismatch(std::any::type_name::<T>()))
            }
        }
    }

    fn mismatch(&self, expected: &'static str) -> ContainerError {
        ContainerError::ArgumentMismatch {
            class: self.class.clone(),
            position: self.position,
            expected,
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("class", &self.class)
            .field("position", &self.position)
            .field("remaining", &self.values.len())
            .finish()
    }
}
