//! 循环依赖检测
//!
//! 每个线程维护一个正在解析的类型栈。同一容器在同一线程上再次解析
//! 栈中已有的类型时即为循环依赖。

use std::cell::RefCell;

use crate::errors::{ContainerError, Result};
use crate::reflect::TypeName;

thread_local! {
    static RESOLVING: RefCell<Vec<(usize, TypeName)>> = const { RefCell::new(Vec::new()) };
}

/// 解析栈守卫，离开作用域时出栈
#[derive(Debug)]
pub(crate) struct ResolutionGuard {
    container: usize,
}

impl ResolutionGuard {
    /// 入栈，类型已在栈中时返回循环依赖错误
    pub(crate) fn enter(container: usize, name: &TypeName) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(chain) = cycle(&stack, container, name) {
                return Err(ContainerError::CircularDependency { chain });
            }
            stack.push((container, name.clone()));
            Ok(Self { container })
        })
    }

    /// 只检查不入栈
    pub(crate) fn check(container: usize, name: &TypeName) -> Result<()> {
        RESOLVING.with(|stack| match cycle(&stack.borrow(), container, name) {
            Some(chain) => Err(ContainerError::CircularDependency { chain }),
            None => Ok(()),
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(owner, _)| *owner == self.container) {
                stack.remove(pos);
            }
        });
    }
}

fn cycle(stack: &[(usize, TypeName)], container: usize, name: &TypeName) -> Option<Vec<TypeName>> {
    let start = stack
        .iter()
        .position(|(owner, resolving)| *owner == container && resolving == name)?;
    let mut chain: Vec<TypeName> = stack[start..]
        .iter()
        .filter(|(owner, _)| *owner == container)
        .map(|(_, resolving)| resolving.clone())
        .collect();
    chain.push(name.clone());
    Some(chain)
}
