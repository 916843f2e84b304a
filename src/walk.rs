//! Flattens a container tree into the order records are unpacked in.
//!
//! A container's immediate children come out as one block, followed by the
//! flattened contents of each child container in the order they were found.
//! For `root = [a, b*, c]`, `b = [d, e*]`, `e = [f]` that is
//! `[a, b, c, d, e, f]`.

use log::warn;

use crate::codec::Codec;
use crate::error::Error;
use crate::vfs::{Container, VirtualFile};

/// Default for how many container levels below the root are enumerated.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Default)]
pub struct Flattened {
    pub records: Vec<VirtualFile>,
    /// Containers whose contents were left out, with the reason.
    pub skipped: Vec<Error>,
}

pub fn flatten<C: Codec + ?Sized>(codec: &C, root: &Container, max_depth: usize) -> Flattened {
    let mut out = Flattened::default();
    // Popping in discovery order needs the pending containers reversed on the stack.
    let mut pending: Vec<(Container, usize)> = vec![(root.clone(), 0)];

    while let Some((container, depth)) = pending.pop() {
        if depth > max_depth {
            let err = Error::DepthExceeded {
                path: container.info().virtual_path().join("/"),
                limit: max_depth,
            };
            warn!("{}", err);
            out.skipped.push(err);
            continue;
        }

        let children = match codec.children(&container) {
            Ok(children) => children,
            Err(err) => {
                warn!("skipping the contents of {}: {}", container.name(), err);
                out.skipped.push(err);
                continue;
            }
        };

        let nested: Vec<Container> = children
            .iter()
            .filter_map(VirtualFile::as_container)
            .cloned()
            .collect();
        out.records.extend(children);
        pending.extend(nested.into_iter().rev().map(|c| (c, depth + 1)));
    }

    out
}
