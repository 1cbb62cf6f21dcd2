//! Application of generated state-change instructions to nation states.

use std::collections::BTreeMap;

use tracing::debug;

use concordat_protocol::{NationCode, NationState, StateChange};

/// Apply one event's state-change instructions.
///
/// Stability and war-support deltas are clamped to [0, 100]; treasury is
/// applied unclamped; occupied regions are union-merged. Generated content
/// is untrusted: instructions naming a nation that does not exist in this
/// save are dropped silently. Returns how many nations were actually
/// touched.
pub fn apply_state_changes(
    nations: &mut BTreeMap<NationCode, NationState>,
    changes: &BTreeMap<NationCode, StateChange>,
) -> usize {
    let mut applied = 0;
    for (code, change) in changes {
        let Some(state) = nations.get_mut(code) else {
            debug!(%code, "state change references unknown nation, skipping");
            continue;
        };
        if let Some(delta) = change.stability {
            state.adjust_stability(delta);
        }
        if let Some(delta) = change.war_support {
            state.adjust_war_support(delta);
        }
        if let Some(delta) = change.treasury {
            state.adjust_treasury(delta.round() as i64);
        }
        if let Some(regions) = &change.occupied_regions {
            state.occupy_regions(regions.iter().cloned());
        }
        applied += 1;
    }
    applied
}
