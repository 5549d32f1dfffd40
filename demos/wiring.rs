//! 装配演示
//!
//! 运行：`AUTOWIRE_LOG=autowire=debug cargo run --example wiring`

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use autowire::{
    args, init_logging, ClassBuilder, DependencyContainer, InterfaceBuilder, LoggingConfig, ParameterDescriptor,
    SingletonSetting, TypeRegistry,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

trait Transport: Send + Sync {
    fn deliver(&self, to: &str, body: &str) -> String;
}

#[derive(Default)]
struct SmtpTransport;

impl Transport for SmtpTransport {
    fn deliver(&self, to: &str, body: &str) -> String {
        format!("SMTP -> {to}: {body}")
    }
}

trait AuditLog: Send + Sync {
    fn record(&self, entry: String);
    fn entries(&self) -> Vec<String>;
}

#[derive(Default)]
struct NullAuditLog {
    entries: Mutex<Vec<String>>,
}

impl AuditLog for NullAuditLog {
    fn record(&self, entry: String) {
        self.entries.lock().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

struct Mailer {
    transport: Arc<dyn Transport>,
    sender: String,
    audit: Mutex<Option<Arc<dyn AuditLog>>>,
}

impl Mailer {
    fn send(&self, to: &str, body: &str) -> String {
        let receipt = self.transport.deliver(to, &format!("{body} (from {})", self.sender));
        if let Some(audit) = self.audit.lock().as_ref() {
            audit.record(receipt.clone());
        }
        receipt
    }
}

#[derive(Debug, Deserialize)]
struct SmtpSettings {
    sender: String,
}

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(InterfaceBuilder::<dyn Transport>::new("mail::TransportInterface").build())
        .with(
            ClassBuilder::<SmtpTransport>::new("mail::DefaultTransport")
                .implements("mail::TransportInterface", |this| this as Arc<dyn Transport>)
                .default_constructor()
                .build(),
        )
        .with(InterfaceBuilder::<dyn AuditLog>::new("audit::AuditLogInterface").build())
        .with(
            ClassBuilder::<NullAuditLog>::new("audit::NullAuditLog")
                .implements("audit::AuditLogInterface", |this| this as Arc<dyn AuditLog>)
                .default_constructor()
                .build(),
        )
        .with(
            ClassBuilder::<Mailer>::new("mail::Mailer")
                .constructor(
                    vec![
                        ParameterDescriptor::typed("transport", "mail::TransportInterface"),
                        ParameterDescriptor::untyped("sender"),
                    ],
                    |args| {
                        Ok(Mailer {
                            transport: args.object::<dyn Transport>()?,
                            sender: args.raw::<String>()?,
                            audit: Mutex::new(None),
                        })
                    },
                )
                .setter("set_audit_log", "audit::AuditLogInterface", |this, audit| {
                    *this.audit.lock() = audit.cast::<dyn AuditLog>();
                    Ok(())
                })
                .build(),
        )
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::from_env()).map_err(|err| anyhow!(err))?;

    let container = DependencyContainer::new(Arc::new(registry()));
    container.set_config("smtp", json!({ "sender": "noreply@example.org" }));

    // 回调工厂从配置中读取发件人，再交给构造函数注入
    container.singleton(
        "mail::Mailer",
        SingletonSetting::factory(|container, _| {
            let settings: SmtpSettings = container.config_as("smtp")?;
            let mailer = container.reflector().instantiate(
                &"mail::Mailer".into(),
                args![container.get("mail::TransportInterface")?, settings.sender],
            )?;
            Ok(mailer)
        }),
    )?;

    let mailer = container.get("mail::Mailer").context("mailer should be wired")?;
    let mailer = mailer.cast::<Mailer>().context("mail::Mailer holds a Mailer")?;
    println!("{}", mailer.send("ada@example.org", "hello"));

    // 单例只在第一次实例化时使用传入参数
    let direct = container.create_with("mail::Mailer", args!["ops@example.org".to_string()])?;
    println!("singleton reused: {}", autowire::Object::ptr_eq(&direct, &container.get("mail::Mailer")?));

    let plain = DependencyContainer::new(Arc::new(registry()));
    let fresh = plain.create_with("mail::Mailer", args!["ops@example.org".to_string()])?;
    let fresh = fresh.cast::<Mailer>().context("mail::Mailer holds a Mailer")?;
    println!("{}", fresh.send("grace@example.org", "setter injected"));

    let audit = plain.get("audit::AuditLogInterface")?;
    let audit = audit.cast::<dyn AuditLog>().context("audit log cast")?;
    println!("audit entries: {:?}", audit.entries());
    println!("stats: {:?}", plain.stats());

    Ok(())
}
