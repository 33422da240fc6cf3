#![cfg(not(target_arch = "wasm32"))]

use range_dom::{
	memory::{MemoryDom, NodeId},
	Dom, DynamicRange,
};

fn placed(dom: &MemoryDom) -> (NodeId, DynamicRange<MemoryDom>) {
	let body = dom.create_element("body").unwrap();
	dom.append_child(&dom.document(), &body).unwrap();
	dom.append_child(&body, &dom.create_text("<")).unwrap();
	let range = DynamicRange::new(dom, "r");
	dom.append_child(&body, &range.detach().unwrap().unwrap()).unwrap();
	dom.append_child(&body, &dom.create_text(">")).unwrap();
	(body, range)
}

/// The nodes strictly between the markers, read from the parent directly.
fn between(dom: &MemoryDom, body: NodeId, range: &DynamicRange<MemoryDom>) -> Vec<NodeId> {
	let children = dom.children(body);
	let start = children.iter().position(|node| node == range.start()).unwrap();
	let end = children.iter().position(|node| node == range.end()).unwrap();
	children[start + 1..end].to_vec()
}

#[test]
fn child_nodes_match_tree_between_markers() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);

	let a = dom.create_text("a");
	let b = dom.create_text("b");
	let c = dom.create_text("c");
	range.append_child(&b).unwrap();
	range.insert_before(&a, Some(&b)).unwrap();
	range.append_child(&c).unwrap();
	assert_eq!(range.child_nodes(), [a, b, c]);
	assert_eq!(range.child_nodes(), between(&dom, body, &range));
	assert_eq!(range.first_child(), Some(a));

	dom.remove_child(&body, &b).unwrap();
	assert_eq!(range.child_nodes(), [a, c]);
	assert_eq!(range.child_nodes(), between(&dom, body, &range));
	assert_eq!(dom.to_html(body), "<body><<!--r-->ac<!--/r-->></body>");
}

#[test]
fn references_outside_the_range_are_ignored() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);
	let outside = dom.children(body)[0];

	range.insert_before(&dom.create_text("x"), Some(&outside)).unwrap();
	range.insert_before(&dom.create_text("y"), Some(range.start())).unwrap();
	let stray = dom.create_text("stray");
	range.insert_before(&dom.create_text("z"), Some(&stray)).unwrap();
	assert!(range.child_nodes().is_empty());

	range.insert_before(&dom.create_text("e"), Some(range.end())).unwrap();
	assert_eq!(dom.to_html(body), "<body><<!--r-->e<!--/r-->></body>");
}

#[test]
fn delete_twice_leaves_siblings_alone() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);
	range.append_child(&dom.create_text("content")).unwrap();

	range.delete().unwrap();
	assert_eq!(dom.to_html(body), "<body><></body>");
	range.delete().unwrap();
	assert_eq!(dom.to_html(body), "<body><></body>");
	assert_eq!(range.parent_node(), None);
	assert!(range.child_nodes().is_empty());
}

#[test]
fn detached_ranges_ignore_mutations() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);
	range.append_child(&dom.create_text("kept")).unwrap();
	range.delete().unwrap();

	range.append_child(&dom.create_text("ignored")).unwrap();
	range.clear().unwrap();
	range.replace(&dom.create_text("ignored")).unwrap();
	assert_eq!(range.detach().unwrap(), None);
	assert_eq!(range.first_child(), None);
	assert!(!range.is_connected());
	assert_eq!(dom.to_html(body), "<body><></body>");
}

#[test]
fn detach_moves_content_as_a_unit() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);
	range.append_child(&dom.create_text("1")).unwrap();
	range.append_child(&dom.create_element("hr").unwrap()).unwrap();
	let other = dom.create_element("aside").unwrap();
	dom.append_child(&body, &other).unwrap();

	let fragment = range.detach().unwrap().unwrap();
	assert_eq!(dom.to_html(body), "<body><><aside></aside></body>");
	assert_eq!(dom.to_html(fragment), "<!--r-->1<hr></hr><!--/r-->");

	dom.append_child(&other, &fragment).unwrap();
	assert_eq!(range.parent_node(), Some(other));
	assert!(range.is_connected());
	assert_eq!(dom.to_html(body), "<body><><aside><!--r-->1<hr></hr><!--/r--></aside></body>");
}

#[test]
fn clear_keeps_markers() {
	let dom = MemoryDom::new();
	let (body, range) = placed(&dom);
	range.append_child(&dom.create_text("a")).unwrap();
	range.append_child(&dom.create_text("b")).unwrap();

	range.clear().unwrap();
	assert_eq!(dom.to_html(body), "<body><<!--r--><!--/r-->></body>");
	range.append_child(&dom.create_text("c")).unwrap();
	assert_eq!(dom.to_html(body), "<body><<!--r-->c<!--/r-->></body>");
}
