//! 类型注册表
//!
//! [`TypeReflector`] 是容器消费的反射能力，[`TypeRegistry`] 是它的默认实现：
//! 启动时一次性填充的描述符表，交给容器后不再修改。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ContainerError;
use crate::reflect::descriptor::{MethodDescriptor, ParameterDescriptor, TypeDescriptor, TypeKind};
use crate::reflect::value::Arguments;
use crate::reflect::{Object, TypeName, Value};

/// 类型反射能力
pub trait TypeReflector: Send + Sync {
    /// 名称是否为已注册的类
    fn class_exists(&self, name: &TypeName) -> bool;

    /// 名称是否为已注册的接口
    fn interface_exists(&self, name: &TypeName) -> bool;

    /// `class` 是否就是 `ty`，或声明实现了 `ty`
    fn is_subtype(&self, class: &TypeName, ty: &TypeName) -> bool;

    /// 值能否传给要求 `ty` 类型的参数
    fn is_assignable(&self, value: &Value, ty: &TypeName) -> bool {
        match value {
            Value::Object(object) => self.is_subtype(object.class(), ty),
            Value::Null | Value::Raw(_) => false,
        }
    }

    /// 构造函数参数列表，没有构造函数时为空
    fn constructor_parameters(&self, class: &TypeName) -> Result<Arc<[ParameterDescriptor]>, ContainerError>;

    /// 类型的公开方法
    fn public_methods(&self, name: &TypeName) -> Vec<MethodDescriptor>;

    /// 使用已解析的参数创建实例
    fn instantiate(&self, class: &TypeName, args: Vec<Value>) -> Result<Object, ContainerError>;

    /// 把外部创建的值包装为 `class` 的实例
    fn wrap(&self, class: &TypeName, value: Arc<dyn Any + Send + Sync>) -> Result<Object, ContainerError>;
}

/// 描述符表
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<TypeName, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册描述符，同名的旧描述符会被替换
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        let name = descriptor.name.clone();
        if self.types.insert(name.clone(), Arc::new(descriptor)).is_some() {
            tracing::warn!("Type \"{}\" registered twice, keeping the latest descriptor", name);
        }
        self
    }

    /// 链式注册
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn descriptor(&self, name: &TypeName) -> Option<&Arc<TypeDescriptor>> {
        let name = name.normalized();
        self.types.get(&name)
    }

    fn class(&self, name: &TypeName) -> Result<&Arc<TypeDescriptor>, ContainerError> {
        self.descriptor(name)
            .filter(|descriptor| descriptor.kind == TypeKind::Class)
            .ok_or_else(|| ContainerError::UnknownDependency(name.clone()))
    }

    fn kind_of(&self, name: &TypeName) -> Option<TypeKind> {
        self.descriptor(name).map(|descriptor| descriptor.kind)
    }
}

impl TypeReflector for TypeRegistry {
    fn class_exists(&self, name: &TypeName) -> bool {
        self.kind_of(name) == Some(TypeKind::Class)
    }

    fn interface_exists(&self, name: &TypeName) -> bool {
        self.kind_of(name) == Some(TypeKind::Interface)
    }

    fn is_subtype(&self, class: &TypeName, ty: &TypeName) -> bool {
        let ty = ty.normalized();
        match self.descriptor(class) {
            Some(descriptor) => descriptor.name == ty || descriptor.implements.contains(&ty),
            None => false,
        }
    }

    fn constructor_parameters(&self, class: &TypeName) -> Result<Arc<[ParameterDescriptor]>, ContainerError> {
        self.class(class).map(|descriptor| Arc::clone(&descriptor.parameters))
    }

    fn public_methods(&self, name: &TypeName) -> Vec<MethodDescriptor> {
        self.descriptor(name)
            .map(|descriptor| descriptor.methods.clone())
            .unwrap_or_default()
    }

    fn instantiate(&self, class: &TypeName, args: Vec<Value>) -> Result<Object, ContainerError> {
        let descriptor = self.class(class)?;
        let construct = descriptor
            .construct
            .as_ref()
            .ok_or_else(|| ContainerError::CreationFailed {
                class: descriptor.name.clone(),
                reason: "class has no registered constructor".to_string(),
            })?;

        let mut arguments = Arguments::new(descriptor.name.clone(), args);
        let value = construct(&mut arguments)?;
        if arguments.remaining() > 0 {
            tracing::debug!(
                "Constructor of \"{}\" ignored {} trailing argument(s)",
                descriptor.name,
                arguments.remaining()
            );
        }

        Ok(Object::new(descriptor.name.clone(), value, Arc::clone(&descriptor.casts)))
    }

    fn wrap(&self, class: &TypeName, value: Arc<dyn Any + Send + Sync>) -> Result<Object, ContainerError> {
        let descriptor = self.class(class)?;
        if descriptor.concrete != Some((*value).type_id()) {
            return Err(ContainerError::TypeMismatch {
                class: descriptor.name.clone(),
                expected: "the concrete type registered for this class",
            });
        }
        Ok(Object::new(descriptor.name.clone(), value, Arc::clone(&descriptor.casts)))
    }
}
