//! 类型元数据层
//!
//! 用启动时注册的描述符代替运行时反射。

pub mod descriptor;
pub mod registry;
pub mod type_name;
pub mod value;

pub use descriptor::{
    ClassBuilder, InterfaceBuilder, InvokeFn, MethodDescriptor, ParameterDescriptor, TypeDescriptor, TypeKind,
};
pub use registry::{TypeReflector, TypeRegistry};
pub use type_name::{TypeName, NAMESPACE_SEPARATOR};
pub use value::{Arguments, Object, Value};
