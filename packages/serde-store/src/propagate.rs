//! Applying payloads to container trees and exporting them back.

use log::trace;

use recstore_core::Container;

use crate::error::Result;
use crate::payload::Payload;

/// Apply `payload` to `container` and, recursively, to its children.
///
/// Values go through [`Container::set`], so transformers and write hooks
/// apply. Child payloads are forwarded to the specialization of the named
/// class-level child, which must exist.
pub fn propagate(container: &Container, payload: Payload) -> Result<()> {
    for (key, value) in payload.values {
        container.set(key, value)?;
    }
    for (name, sub) in payload.children {
        trace!(
            "propagating {} entries to {}.{}",
            sub.values.len(),
            container.class().name(),
            name
        );
        propagate(&container.child(&name)?, sub)?;
    }
    Ok(())
}

/// Export a container subtree as a payload.
///
/// The root contributes its local store. Every class-level child
/// contributes the entries of its chain stores that its owner does not
/// also see, so values inherited from the owner are not repeated.
pub fn deploy(container: &Container) -> Result<Payload> {
    let mut payload = Payload::new();
    payload.values.extend(container.local().entries());
    deploy_children(container, &mut payload)?;
    Ok(payload)
}

fn deploy_children(owner: &Container, payload: &mut Payload) -> Result<()> {
    let class = owner.class();
    let owner_chain = owner.chain();
    for (name, _) in class.children() {
        let child = owner.child(name)?;
        let chain = child.chain();

        let mut sub = Payload::new();
        for layer in chain.layers().iter().rev() {
            if !owner_chain.contains_layer(layer) {
                sub.values.extend(layer.entries());
            }
        }
        deploy_children(&child, &mut sub)?;
        payload.children.insert(name.to_string(), sub);
    }
    Ok(())
}
