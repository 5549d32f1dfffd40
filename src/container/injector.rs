//! 注入器
//!
//! 实例构造完成后由注入器补全装配。默认的 [`SetterInjector`] 按约定调用
//! `set` 开头、只接受一个带类型要求参数的方法。

use std::fmt;

use once_cell::sync::OnceCell;

use crate::container::{DependencyContainer, InjectionStatus};
use crate::errors::Result;
use crate::reflect::{MethodDescriptor, Object, TypeName, Value};

/// setter 方法名前缀
pub const SETTER_PREFIX: &str = "set";

/// 注入器 trait
pub trait Injector: Send + Sync {
    /// 负责的类型名称
    fn responsible_for(&self) -> &TypeName;

    /// 对构造好的实例执行注入，跳过 `status` 中已满足的依赖
    fn inject(&self, container: &DependencyContainer, object: &Object, status: &mut InjectionStatus) -> Result<()>;
}

#[derive(Debug)]
struct SetterMethod {
    method: MethodDescriptor,
    dependency: TypeName,
}

/// setter 注入器
#[derive(Debug)]
pub struct SetterInjector {
    responsible_for: TypeName,
    methods: OnceCell<Vec<SetterMethod>>,
}

impl SetterInjector {
    pub fn new(responsible_for: impl Into<TypeName>) -> Self {
        Self {
            responsible_for: responsible_for.into().normalized(),
            methods: OnceCell::new(),
        }
    }

    /// 首次使用时筛选 setter 方法，之后复用
    fn methods(&self, container: &DependencyContainer) -> &[SetterMethod] {
        self.methods.get_or_init(|| {
            let methods: Vec<SetterMethod> = container
                .reflector()
                .public_methods(&self.responsible_for)
                .into_iter()
                .filter(|method| method.name().starts_with(SETTER_PREFIX))
                .filter_map(|method| {
                    let dependency = match method.parameters() {
                        [parameter] => parameter.required_type()?.clone(),
                        _ => return None,
                    };
                    Some(SetterMethod { method, dependency })
                })
                .collect();

            tracing::debug!(
                "Found {} setter method(s) on \"{}\"",
                methods.len(),
                self.responsible_for
            );
            methods
        })
    }

    /// 按发现顺序排列的 setter 方法名
    pub fn setter_names(&self, container: &DependencyContainer) -> Vec<&str> {
        self.methods(container)
            .iter()
            .map(|setter| setter.method.name())
            .collect()
    }
}

impl Injector for SetterInjector {
    fn responsible_for(&self) -> &TypeName {
        &self.responsible_for
    }

    fn inject(&self, container: &DependencyContainer, object: &Object, status: &mut InjectionStatus) -> Result<()> {
        for setter in self.methods(container) {
            if status.is_satisfied(&setter.dependency) {
                tracing::debug!(
                    "Skipping {}::{}, \"{}\" already injected",
                    self.responsible_for,
                    setter.method.name(),
                    setter.dependency
                );
                continue;
            }

            let dependency = container.get(&setter.dependency)?;
            tracing::debug!(
                "Injecting \"{}\" into {}::{}",
                setter.dependency,
                self.responsible_for,
                setter.method.name()
            );
            setter.method.invoke(object, vec![Value::Object(dependency)])?;
            status.mark(&setter.dependency);
        }
        Ok(())
    }
}

impl fmt::Debug for dyn Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("responsible_for", self.responsible_for())
            .finish_non_exhaustive()
    }
}
