use crate::region::embedded_identifier;
use driftcheck_state::StateSnapshot;
use driftcheck_types::{ResourceMode, WorkItem};
use tracing::debug;

/// Flatten every current instance of every resource into a work item.
///
/// Output follows snapshot order. Deposed objects are skipped: they share
/// an address with the current instance and are not tracked by id.
pub fn enumerate(snapshot: &StateSnapshot) -> Vec<WorkItem> {
    let mut items = Vec::with_capacity(snapshot.instance_count());

    for resource in &snapshot.resources {
        let mode = ResourceMode::from_mode(&resource.mode);
        for instance in &resource.instances {
            let address = resource.instance_address(instance);
            if let Some(deposed) = &instance.deposed {
                debug!(address = %address, deposed = %deposed, "skipping deposed object");
                continue;
            }

            let mut item = WorkItem::new(address, resource.kind.clone()).with_mode(mode);
            match instance.decode_attributes() {
                Ok(attributes) => {
                    item.declared_id = attributes.non_empty("id").unwrap_or_default().to_string();
                    item.embedded_identifier = embedded_identifier(&attributes);
                    item.attributes = attributes;
                }
                Err(e) => {
                    item.attribute_error = Some(format!(
                        "failed to decode attributes for {}: {e}",
                        item.address
                    ));
                }
            }
            items.push(item);
        }
    }

    debug!(count = items.len(), "enumerated work items");
    items
}
