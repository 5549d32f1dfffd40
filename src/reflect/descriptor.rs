//! 类型描述符
//!
//! 描述符取代运行时反射：每个类或接口在启动时注册一次，
//! 记录构造函数参数、可调用的方法以及实现的接口。

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::ContainerError;
use crate::reflect::value::{Arguments, CastTable, SharedAny};
use crate::reflect::{Object, TypeName, Value};

pub(crate) type ConstructFn = Arc<dyn Fn(&mut Arguments) -> Result<SharedAny, ContainerError> + Send + Sync>;

/// 方法调用函数：接收目标实例和位置参数
pub type InvokeFn = Arc<dyn Fn(&Object, Vec<Value>) -> Result<(), ContainerError> + Send + Sync>;

/// 构造函数或方法的参数描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    optional: bool,
    required_type: Option<TypeName>,
}

impl ParameterDescriptor {
    /// 要求指定类型实例的参数
    pub fn typed(name: impl Into<String>, required_type: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            required_type: Some(required_type.into().normalized()),
        }
    }

    /// 没有类型要求的参数，只能由调用方提供
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            required_type: None,
        }
    }

    /// 标记为可选参数，无法满足时传入 `Value::Null`
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn required_type(&self) -> Option<&TypeName> {
        self.required_type.as_ref()
    }
}

/// 方法描述
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    parameters: Vec<ParameterDescriptor>,
    invoke: InvokeFn,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterDescriptor>, invoke: InvokeFn) -> Self {
        Self {
            name: name.into(),
            parameters,
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn invoke(&self, target: &Object, args: Vec<Value>) -> Result<(), ContainerError> {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

/// 已注册类型的完整描述
pub struct TypeDescriptor {
    pub(crate) name: TypeName,
    pub(crate) kind: TypeKind,
    pub(crate) implements: Vec<TypeName>,
    pub(crate) parameters: Arc<[ParameterDescriptor]>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) concrete: Option<TypeId>,
    pub(crate) casts: Arc<CastTable>,
    pub(crate) methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn implements(&self) -> &[TypeName] {
        &self.implements
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("implements", &self.implements)
            .field("parameters", &self.parameters)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

fn setter_invoke<T, D>(method: &str, target_name: &TypeName, apply: D) -> InvokeFn
where
    T: ?Sized + 'static,
    D: Fn(&T, Object) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    let method = method.to_string();
    let target_name = target_name.clone();
    Arc::new(move |target: &Object, args: Vec<Value>| {
        let this = target.cast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            class: target.class().clone(),
            expected: std::any::type_name::<T>(),
        })?;
        let dependency = args
            .into_iter()
            .next()
            .and_then(Value::into_object)
            .ok_or_else(|| ContainerError::ArgumentMismatch {
                class: target_name.clone(),
                position: 1,
                expected: "object",
            })?;
        tracing::trace!("Invoking {}::{}", target_name, method);
        apply(&*this, dependency)
    })
}

fn method_invoke<T, M>(apply: M) -> InvokeFn
where
    T: ?Sized + 'static,
    M: Fn(&T, Vec<Value>) -> Result<(), ContainerError> + Send + Sync + 'static,
{
    Arc::new(move |target: &Object, args: Vec<Value>| {
        let this = target.cast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            class: target.class().clone(),
            expected: std::any::type_name::<T>(),
        })?;
        apply(&*this, args)
    })
}

/// 类描述构建器
///
/// ```ignore
/// let descriptor = ClassBuilder::<SmtpMailer>::new("app::SmtpMailer")
///     .implements("app::MailerInterface", |this| this as Arc<dyn Mailer>)
///     .constructor(
///         vec![ParameterDescriptor::typed("transport", "app::TransportInterface")],
///         |args| Ok(SmtpMailer::new(args.object::<dyn Transport>()?)),
///     )
///     .setter("set_logger", "app::LoggerInterface", |this, logger| {
///         this.set_logger(logger.cast::<dyn Logger>());
///         Ok(())
///     })
///     .build();
/// ```
pub struct ClassBuilder<T> {
    name: TypeName,
    implements: Vec<TypeName>,
    parameters: Vec<ParameterDescriptor>,
    construct: Option<ConstructFn>,
    casts: CastTable,
    methods: Vec<MethodDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    pub fn new(name: impl Into<TypeName>) -> Self {
        let mut casts = CastTable::default();
        casts.insert::<T, T, _>(|this| this);
        Self {
            name: name.into().normalized(),
            implements: Vec::new(),
            parameters: Vec::new(),
            construct: None,
            casts,
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 声明实现的接口，并提供到接口 trait 对象的转换
    pub fn implements<I, F>(mut self, interface: impl Into<TypeName>, upcast: F) -> Self
    where
        I: ?Sized + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.implements.push(interface.into().normalized());
        self.casts.insert::<T, I, F>(upcast);
        self
    }

    /// 声明构造函数及其参数
    pub fn constructor<F>(mut self, parameters: Vec<ParameterDescriptor>, construct: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.parameters = parameters;
        self.construct = Some(Arc::new(move |args: &mut Arguments| {
            construct(args).map(|instance| Arc::new(instance) as SharedAny)
        }));
        self
    }

    /// 声明 setter 方法：只有一个参数，参数要求 `dependency` 类型的实例
    pub fn setter<F>(mut self, method: impl Into<String>, dependency: impl Into<TypeName>, apply: F) -> Self
    where
        F: Fn(&T, Object) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        let method = method.into();
        let invoke = setter_invoke::<T, F>(&method, &self.name, apply);
        let parameters = vec![ParameterDescriptor::typed("dependency", dependency)];
        self.methods.push(MethodDescriptor::new(method, parameters, invoke));
        self
    }

    /// 声明任意公开方法
    pub fn method<F>(mut self, name: impl Into<String>, parameters: Vec<ParameterDescriptor>, apply: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        self.methods
            .push(MethodDescriptor::new(name, parameters, method_invoke::<T, F>(apply)));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            kind: TypeKind::Class,
            implements: self.implements,
            parameters: self.parameters.into(),
            construct: self.construct,
            concrete: Some(TypeId::of::<T>()),
            casts: Arc::new(self.casts),
            methods: self.methods,
        }
    }
}

impl<T: Any + Send + Sync + Default> ClassBuilder<T> {
    /// 没有构造函数的类：参数列表为空，使用 `Default` 创建
    pub fn default_constructor(self) -> Self {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }
}

/// 接口描述构建器
///
/// 接口上声明的 setter 在请求该接口时执行，目标实例通过 `cast::<I>()` 取得。
pub struct InterfaceBuilder<I: ?Sized> {
    name: TypeName,
    methods: Vec<MethodDescriptor>,
    _marker: PhantomData<fn() -> Box<I>>,
}

impl<I: ?Sized + 'static> InterfaceBuilder<I> {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into().normalized(),
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn setter<F>(mut self, method: impl Into<String>, dependency: impl Into<TypeName>, apply: F) -> Self
    where
        F: Fn(&I, Object) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        let method = method.into();
        let invoke = setter_invoke::<I, F>(&method, &self.name, apply);
        let parameters = vec![ParameterDescriptor::typed("dependency", dependency)];
        self.methods.push(MethodDescriptor::new(method, parameters, invoke));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, parameters: Vec<ParameterDescriptor>, apply: F) -> Self
    where
        F: Fn(&I, Vec<Value>) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        self.methods
            .push(MethodDescriptor::new(name, parameters, method_invoke::<I, F>(apply)));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            name: self.name,
            kind: TypeKind::Interface,
            implements: Vec::new(),
            parameters: Arc::from(Vec::new()),
            construct: None,
            concrete: None,
            casts: Arc::new(CastTable::default()),
            methods: self.methods,
        }
    }
}
