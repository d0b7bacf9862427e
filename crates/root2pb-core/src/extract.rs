//! Schema extraction: tree branches to an ordered field list

use crate::ids::IdAllocator;
use crate::schema::{field_name, Field, FieldList, FieldType};
use crate::select::BranchSelection;
use crate::source::TreeSource;
use crate::typemap::map_native_type;
use root2pb_common::Result;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Build the field list for `tree`.
///
/// Branches are visited in declaration order; rejected branches consume no
/// id. Field names are normalized with [`field_name`], and a name already
/// taken by an earlier field gets its id appended (`el_eta_7`) until it is
/// free.
pub fn extract_fields(
    source: &dyn TreeSource,
    tree: &str,
    selection: &BranchSelection,
    ids: &IdAllocator,
    verbose: bool,
) -> Result<FieldList> {
    let tree = source.require_tree(tree)?;
    let branches = tree.branches();

    for pattern in selection.malformed() {
        warn!(pattern = %pattern, "Ignoring malformed branch pattern");
    }

    if verbose {
        info!(tree = %tree.name(), branches = branches.len(), "Inspecting tree");
    } else {
        debug!(tree = %tree.name(), branches = branches.len(), "Inspecting tree");
    }

    let mut fields = FieldList::with_capacity(branches.len());
    let mut taken: HashSet<String> = HashSet::new();
    let mut resolved: BTreeSet<FieldType> = BTreeSet::new();

    for (index, branch) in branches.iter().enumerate() {
        let native = branch.native_type();
        let (field_type, repeated) = map_native_type(native);
        let accepted = selection.accepts(&branch.name);

        if verbose {
            info!(
                index,
                branch = %branch.name,
                class = %branch.class_name,
                native = %native,
                mapped = %field_type,
                repeated,
                accepted,
                "Branch"
            );
        } else {
            debug!(index, branch = %branch.name, native = %native, accepted, "Branch");
        }

        if !accepted {
            continue;
        }

        let id = ids.next_id()?;
        let mut name = field_name(&branch.name);
        while taken.contains(&name) {
            name = format!("{}_{}", name, id);
        }
        taken.insert(name.clone());

        if let FieldType::Unresolved(native) = &field_type {
            warn!(
                branch = %branch.name,
                native = %native,
                "No protobuf type for branch; the schema compiler will reject it"
            );
        }
        resolved.insert(field_type.clone());

        fields.push(Field {
            name,
            field_type,
            id,
            branch: branch.name.clone(),
            repeated,
        });
    }

    let types: Vec<String> = resolved.iter().map(ToString::to_string).collect();
    if verbose {
        info!(fields = fields.len(), types = ?types, "Resolved field types");
    } else {
        debug!(fields = fields.len(), types = ?types, "Resolved field types");
    }

    Ok(fields)
}
