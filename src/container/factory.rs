//! 工厂
//!
//! 工厂负责为一个类型名称产出实例。容器内置两种实现：
//! 包装用户回调的 [`CallbackFactory`]，以及按构造函数签名自动装配的
//! [`ConstructorInjectionFactory`]。

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::{DependencyContainer, InjectionStatus};
use crate::errors::{ContainerError, Result};
use crate::reflect::{Object, ParameterDescriptor, TypeName, Value};

/// 用户注册的工厂回调
///
/// 第一个参数是容器本身，之后是调用方传入的位置参数。
pub type FactoryFn = Arc<dyn Fn(&DependencyContainer, Vec<Value>) -> Result<Object> + Send + Sync>;

/// 工厂 trait
pub trait Factory: Send + Sync {
    /// 负责创建的类型名称
    fn responsible_for(&self) -> &TypeName;

    /// 创建实例，并在 `status` 中记录构造期间已满足的依赖
    fn create(&self, container: &DependencyContainer, status: &mut InjectionStatus, args: Vec<Value>) -> Result<Object>;
}

/// 回调工厂
pub struct CallbackFactory {
    responsible_for: TypeName,
    callback: FactoryFn,
}

impl CallbackFactory {
    pub fn new(responsible_for: impl Into<TypeName>, callback: FactoryFn) -> Self {
        Self {
            responsible_for: responsible_for.into().normalized(),
            callback,
        }
    }
}

impl Factory for CallbackFactory {
    fn responsible_for(&self) -> &TypeName {
        &self.responsible_for
    }

    // 回调自行决定注入了什么，不记录注入状态
    fn create(
        &self,
        container: &DependencyContainer,
        _status: &mut InjectionStatus,
        args: Vec<Value>,
    ) -> Result<Object> {
        tracing::debug!(
            "Invoking factory callback for \"{}\" with {} argument(s)",
            self.responsible_for,
            args.len()
        );
        (self.callback)(container, args)
    }
}

impl fmt::Debug for CallbackFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFactory")
            .field("responsible_for", &self.responsible_for)
            .finish_non_exhaustive()
    }
}

/// 构造函数注入工厂
///
/// 首次使用时读取一次构造函数参数列表并缓存。对每个参数位置：
///
/// - 有类型要求：下一个传入参数可赋值时直接使用，否则由容器创建；
///   都不行时可选参数取空值，必需参数报错
/// - 无类型要求：取下一个传入参数，没有剩余时可选参数取空值，必需参数报错
///
/// 传入参数严格从左到右消费，只能满足"下一个"匹配的参数位置。
#[derive(Debug)]
pub struct ConstructorInjectionFactory {
    responsible_for: TypeName,
    parameters: OnceCell<Arc<[ParameterDescriptor]>>,
}

impl ConstructorInjectionFactory {
    pub fn new(responsible_for: impl Into<TypeName>) -> Self {
        Self {
            responsible_for: responsible_for.into().normalized(),
            parameters: OnceCell::new(),
        }
    }

    fn parameters(&self, container: &DependencyContainer) -> Result<&Arc<[ParameterDescriptor]>> {
        self.parameters
            .get_or_try_init(|| container.reflector().constructor_parameters(&self.responsible_for))
    }

    fn resolve_typed(
        &self,
        container: &DependencyContainer,
        status: &mut InjectionStatus,
        supplied: &mut VecDeque<Value>,
        position: usize,
        parameter: &ParameterDescriptor,
        required: &TypeName,
    ) -> Result<Value> {
        let head_matches = supplied
            .front()
            .is_some_and(|head| container.reflector().is_assignable(head, required));
        if head_matches {
            tracing::debug!(
                "Using a supplied argument for parameter #{} ${} of \"{}\"",
                position,
                parameter.name(),
                self.responsible_for
            );
            status.mark(required);
            return Ok(supplied.pop_front().unwrap_or_default());
        }

        tracing::debug!(
            "Fetching dependency \"{}\" for parameter #{} ${} of \"{}\"",
            required,
            position,
            parameter.name(),
            self.responsible_for
        );
        match container.create(required) {
            Ok(dependency) => {
                status.mark(required);
                Ok(Value::Object(dependency))
            }
            Err(err) if parameter.is_optional() => {
                tracing::debug!(
                    "Using NULL for optional parameter #{} ${} of \"{}\": {}",
                    position,
                    parameter.name(),
                    self.responsible_for,
                    err
                );
                Ok(Value::Null)
            }
            Err(err @ ContainerError::CircularDependency { .. }) => Err(err),
            Err(err) => Err(ContainerError::UnresolvableDependency {
                class: self.responsible_for.clone(),
                position,
                parameter: parameter.name().to_string(),
                required: required.clone(),
                source: Box::new(err),
            }),
        }
    }

    fn resolve_untyped(
        &self,
        supplied: &mut VecDeque<Value>,
        position: usize,
        parameter: &ParameterDescriptor,
    ) -> Result<Value> {
        if let Some(value) = supplied.pop_front() {
            tracing::debug!(
                "Using a supplied argument for parameter #{} ${} of \"{}\"",
                position,
                parameter.name(),
                self.responsible_for
            );
            return Ok(value);
        }

        if parameter.is_optional() {
            tracing::debug!(
                "Using NULL for optional parameter #{} ${} of \"{}\"",
                position,
                parameter.name(),
                self.responsible_for
            );
            return Ok(Value::Null);
        }

        Err(ContainerError::MissingArgument {
            class: self.responsible_for.clone(),
            position,
            parameter: parameter.name().to_string(),
        })
    }
}

impl Factory for ConstructorInjectionFactory {
    fn responsible_for(&self) -> &TypeName {
        &self.responsible_for
    }

    fn create(
        &self,
        container: &DependencyContainer,
        status: &mut InjectionStatus,
        args: Vec<Value>,
    ) -> Result<Object> {
        let parameters = Arc::clone(self.parameters(container)?);
        let mut supplied = VecDeque::from(args);
        let mut resolved = Vec::with_capacity(parameters.len());

        for (index, parameter) in parameters.iter().enumerate() {
            let position = index + 1;
            let value = match parameter.required_type() {
                Some(required) => self.resolve_typed(container, status, &mut supplied, position, parameter, required)?,
                None => self.resolve_untyped(&mut supplied, position, parameter)?,
            };
            resolved.push(value);
        }

        if !supplied.is_empty() {
            tracing::debug!(
                "Dropping {} unused supplied argument(s) for \"{}\"",
                supplied.len(),
                self.responsible_for
            );
        }

        tracing::debug!(
            "Creating new instance of class \"{}\" using {} parameters",
            self.responsible_for,
            resolved.len()
        );
        container.reflector().instantiate(&self.responsible_for, resolved)
    }
}
