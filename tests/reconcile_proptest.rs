#![cfg(not(target_arch = "wasm32"))]

//! Property tests for keyed reconciliation, against a reference that looks keys up in the whole previous list.

use proptest::prelude::*;
use range_dom::{
	memory::{MemoryDom, NodeKind},
	Dom, DynamicRange, FnRenderer, RangeList, Render,
};
use std::{collections::HashMap, future::Future};

const KEYS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

fn block_on<F: Future>(future: F) -> F::Output {
	let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
	tokio::task::LocalSet::new().block_on(&runtime, future)
}

async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

fn arbitrary_order() -> impl Strategy<Value = Vec<char>> {
	prop::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len()).prop_shuffle()
}

/// Versioned values, so that some assignments change values without changing keys.
fn arbitrary_assignment() -> impl Strategy<Value = Vec<(char, u8)>> {
	arbitrary_order().prop_flat_map(|keys| {
		let len = keys.len();
		(Just(keys), prop::collection::vec(0..2_u8, len)).prop_map(|(keys, versions)| keys.into_iter().zip(versions).collect())
	})
}

fn list(dom: &MemoryDom, updater: bool) -> RangeList<MemoryDom, (char, u8)> {
	let renderer = FnRenderer::<MemoryDom, (char, u8)>::new(|(key, _)| key.to_string(), |&(key, version)| Render::from(format!("{}{}", key, version)));
	let renderer = if updater {
		renderer.with_update(|_, &(key, version), _| Render::from(format!("{}{}", key, version)))
	} else {
		renderer
	};
	RangeList::new(dom, renderer.with_id("p"), vec![]).unwrap()
}

/// Item marker labels in tree order.
fn rendered_keys(dom: &MemoryDom, list: &RangeList<MemoryDom, (char, u8)>) -> Vec<String> {
	list.root()
		.child_nodes()
		.into_iter()
		.filter_map(|node| match dom.kind(node) {
			NodeKind::Comment(label) if !label.starts_with('/') => Some(label.trim_start_matches("p:").to_owned()),
			_ => None,
		})
		.collect()
}

fn expected_text(values: &[(char, u8)]) -> String {
	values.iter().map(|(key, version)| format!("{}{}", key, version)).collect()
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// After each assignment, the list holds exactly the target, in order, in the tree too.
	/// Ranges are kept for every key that stays, as a whole-list key lookup would keep them.
	#[test]
	fn assign_matches_full_rescan_reference(
		assignments in prop::collection::vec(arbitrary_assignment(), 1..6),
		updater in any::<bool>(),
	) {
		block_on(async {
			let dom = MemoryDom::new();
			let body = dom.create_element("body").unwrap();
			dom.append_child(&dom.document(), &body).unwrap();
			let list = list(&dom, updater);
			range_dom::render::mount(&dom, body, list.render()).await.unwrap();

			let mut previous = HashMap::<char, ((char, u8), DynamicRange<MemoryDom>)>::new();
			for target in assignments {
				list.assign(target.clone()).unwrap();
				settle().await;

				assert_eq!(list.values(), target);
				let keys = target.iter().map(|(key, _)| key.to_string()).collect::<Vec<_>>();
				assert_eq!(list.keys(), keys);
				assert_eq!(rendered_keys(&dom, &list), keys);
				assert_eq!(dom.text_content(body), expected_text(&target));

				let mut current = HashMap::new();
				for value in &target {
					let range = list.range(&value.0.to_string()).unwrap();
					if let Some((old_value, old_range)) = previous.get(&value.0) {
						if updater || old_value == value {
							assert_eq!(&range, old_range, "range for {:?} should have been kept", value.0);
						} else {
							assert_ne!(&range, old_range, "range for {:?} should have been re-rendered", value.0);
						}
					}
					current.insert(value.0, (*value, range));
				}
				for (key, (_, old_range)) in &previous {
					if !current.contains_key(key) {
						assert_eq!(old_range.parent_node(), None, "range for {:?} should have been deleted", key);
					}
				}
				previous = current;
			}
		});
	}

	/// Appends, prepends and removals keep tree order and list order in sync.
	#[test]
	fn mixed_operations_keep_tree_in_sync(
		ops in prop::collection::vec((0..4_u8, arbitrary_order(), prop::sample::select(KEYS.to_vec())), 1..12),
	) {
		block_on(async {
			let dom = MemoryDom::new();
			let body = dom.create_element("body").unwrap();
			dom.append_child(&dom.document(), &body).unwrap();
			let list = list(&dom, false);
			range_dom::render::mount(&dom, body, list.render()).await.unwrap();

			for (op, keys, anchor) in ops {
				let values = keys.iter().map(|&key| (key, 0)).collect::<Vec<_>>();
				let anchor = anchor.to_string();
				match op {
					0 => list.append_unique(values, Some(&anchor)).unwrap(),
					1 => list.prepend_unique(values, Some(&anchor)).unwrap(),
					2 => list.remove(&keys.iter().map(char::to_string).collect::<Vec<_>>()[..]).unwrap(),
					_ => list.assign(values).unwrap(),
				}
				settle().await;

				let keys = list.keys();
				assert_eq!(rendered_keys(&dom, &list), keys);
				assert_eq!(dom.text_content(body), expected_text(&list.values()));
				let mut unique = keys.clone();
				unique.sort();
				unique.dedup();
				assert_eq!(unique.len(), keys.len());
			}
		});
	}
}
