#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Promise};
use range_dom::{render::mount, web::WebDom, Dom, DynamicRange, FnRenderer, RangeList, Render};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Element, Node};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn setup() -> (WebDom, Node) {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let dom = WebDom::from_window().unwrap();
	let body: Node = window().unwrap().document().unwrap().body().unwrap().into();
	let div = dom.create_element("div").unwrap();
	dom.append_child(&body, &div).unwrap();
	(dom, div)
}

/// Lets spawned tasks run.
async fn settle() {
	for _ in 0..4 {
		JsFuture::from(Promise::resolve(&JsValue::UNDEFINED)).await.unwrap();
	}
}

#[wasm_bindgen_test]
fn range_markers_are_comments() {
	let (dom, div) = setup();
	let range = DynamicRange::new(&dom, "web");
	dom.append_child(&div, &range.detach().unwrap().unwrap()).unwrap();
	range.append_child(&dom.create_text("inside")).unwrap();

	assert_eq!(div.text_content().unwrap(), "inside");
	assert_eq!(div.child_nodes().length(), 3);
	assert_eq!(range.parent_node(), Some(div.clone()));

	range.delete().unwrap();
	range.delete().unwrap();
	assert_eq!(div.child_nodes().length(), 0);
}

#[wasm_bindgen_test]
async fn list_reorders_in_place() {
	let (dom, div) = setup();
	let renderer = FnRenderer::<WebDom, &'static str>::new(|value| (*value).to_owned(), |value| Render::from(*value));
	let list = RangeList::new(&dom, renderer, vec!["a", "b", "c"]).unwrap();
	mount(&dom, div.clone(), list.render()).await.unwrap();
	settle().await;
	assert_eq!(div.text_content().unwrap(), "abc");

	let b = list.range("b").unwrap();
	list.assign(vec!["c", "b"]).unwrap();
	settle().await;
	assert_eq!(div.text_content().unwrap(), "cb");
	assert_eq!(list.range("b").unwrap(), b);
}

#[wasm_bindgen_test]
async fn js_values_render_by_shape() {
	let (dom, div) = setup();
	let array = Array::of3(&JsValue::from_str("x"), &JsValue::TRUE, &dom.create_text("y").into());
	let promise = Promise::resolve(&JsValue::from_str("z"));
	let range = DynamicRange::new(&dom, "shapes");
	dom.append_child(&div, &range.detach().unwrap().unwrap()).unwrap();

	range_dom::render::mutate_range(range.clone(), Render::from(JsValue::from(array))).await.unwrap();
	assert_eq!(div.text_content().unwrap(), "xy");

	range_dom::render::mutate_range(range, Render::from(JsValue::from(promise))).await.unwrap();
	assert_eq!(div.text_content().unwrap(), "z");
}

#[wasm_bindgen_test]
async fn generators_advance_as_items_resolve() {
	let (dom, div) = setup();
	let generator = Function::new_with_args(
		"div",
		"return (function* () { yield document.createTextNode('a'); div.setAttribute('data-seen', div.textContent); yield 'b'; })()",
	)
	.call1(&JsValue::UNDEFINED, &div)
	.unwrap();

	range_dom::render::mutate(&dom, div.clone(), Render::from(generator)).await.unwrap();
	assert_eq!(div.dyn_ref::<Element>().unwrap().get_attribute("data-seen").as_deref(), Some("a"));
	assert_eq!(div.text_content().unwrap(), "b");
}

#[wasm_bindgen_test]
async fn functions_in_ranges_receive_the_parent() {
	let (dom, div) = setup();
	let function = Function::new_with_args("node", "return node === this ? node.nodeName : 'mismatch'");
	let range = DynamicRange::new(&dom, "function");
	dom.append_child(&div, &range.detach().unwrap().unwrap()).unwrap();

	range_dom::render::mutate_range(range.clone(), Render::from(JsValue::from(function))).await.unwrap();
	assert_eq!(div.text_content().unwrap(), "DIV");
	assert_eq!(range.child_nodes().len(), 1);
}
