//! One-shot lookup and browse against an in-process engine that publishes
//! nothing.

use crate::di::EngineServices;
use mdnsd_domain::{BrowseEvent, Config, LookupOperation, LookupReply, LookupRequest, RData};
use tracing::debug;

/// Prints the answer and reports whether one was found.
pub async fn run_lookup(
    config: &Config,
    operation: LookupOperation,
    target: &str,
) -> anyhow::Result<bool> {
    let services = EngineServices::start(config, None).await?;

    let request = LookupRequest::new(operation, target);
    let reply = services.lookup.execute(&request).await;
    services.stop().await;

    let reply = reply?;
    println!("{}", format_reply(operation, &reply));
    Ok(reply.is_found())
}

/// Prints browse events until interrupted.
pub async fn run_browse(config: &Config, service_type: &str) -> anyhow::Result<()> {
    let services = EngineServices::start(config, None).await?;
    let mut subscription = services.browse.execute(service_type).await?;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => break,
            event = subscription.next() => match event {
                Some(event) => println!("{}", format_event(&event)),
                None => break,
            },
        }
    }

    debug!(id = subscription.id, "Ending browse");
    services.browse.cancel(subscription).await?;
    services.stop().await;
    Ok(())
}

fn format_reply(operation: LookupOperation, reply: &LookupReply) -> String {
    let rdata = match reply {
        LookupReply::Found(rdata) => rdata,
        LookupReply::NotFound => {
            let what = match operation {
                LookupOperation::ByName => "Address",
                LookupOperation::ByAddress => "Name",
                LookupOperation::Hinfo => "Hinfo",
                LookupOperation::Srv => "Service",
                LookupOperation::Txt => "Text",
            };
            return format!("{} not found.", what);
        }
    };

    match rdata {
        RData::A(addr) => format!("Address: {}", addr),
        RData::Ptr(name) => format!("Hostname: {}", name),
        RData::Hinfo(hinfo) => format!("Cpu: {}\nOs: {}", hinfo.cpu, hinfo.os),
        RData::Srv(srv) => format!(
            "Name: {}\nPort: {}\nPriority: {}\nWeight: {}",
            srv.target, srv.port, srv.priority, srv.weight
        ),
        RData::Txt(strings) => strings.join("\n"),
        other => other.to_string(),
    }
}

fn format_event(event: &BrowseEvent) -> String {
    let instance = event.record.rdata.target().unwrap_or_default();
    format!("{} {} {}", event.kind, event.interface, instance)
}
