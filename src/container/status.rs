use std::collections::HashSet;

use crate::reflect::TypeName;

/// 注入状态
///
/// 记录一次实例构造过程中已经满足的依赖类型，构造完成后交给注入器，
/// 避免同一个依赖被注入两次。每个实例独占一份，不在实例之间共享。
#[derive(Debug, Default, Clone)]
pub struct InjectionStatus {
    satisfied: HashSet<TypeName>,
}

impl InjectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记依赖类型已满足
    pub fn mark(&mut self, dependency: &TypeName) {
        self.satisfied.insert(dependency.normalized());
    }

    pub fn is_satisfied(&self, dependency: &TypeName) -> bool {
        self.satisfied.contains(dependency.normalized().as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.satisfied.iter()
    }

    pub fn len(&self) -> usize {
        self.satisfied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satisfied.is_empty()
    }
}
