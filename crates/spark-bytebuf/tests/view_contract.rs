//! `view_contract` 集成测试：验证视图层的别名、夹取与复制契约。
//!
//! # 测试目标（Why）
//! - 切片与子数组只产生窗口，通过任意层级派生的写入都必须对父视图可见；
//! - 区间参数的宽松转换规则（负下标、`NaN`、布尔、数字串、`±Infinity`）必须一致；
//! - `copy` 在源与目标别名时仍保持 `memmove` 语义。

use spark_bytebuf::{ByteStore, ByteView, HostValue, INSPECT_MAX_BYTES};

fn view(bytes: &[u8]) -> ByteView {
    ByteView::from(bytes)
}

/// 场景：`[1,2,3,4,5]` 的 `slice(1,4)` 为 `[2,3,4]`，写入子视图后父视图下标 1 读到 99。
#[test]
fn slice_scenario_is_observable_through_parent() {
    let parent = view(&[1, 2, 3, 4, 5]);
    let child = parent.slice(1, 4);
    assert_eq!(child.to_vec(), vec![2, 3, 4]);
    child.set(0, 99).unwrap();
    assert_eq!(parent.get(1), Some(99));
}

/// 别名在两层以上的嵌套派生中双向成立。
#[test]
fn aliasing_holds_across_nested_derivations() {
    let parent = view(&[0; 8]);
    let level1 = parent.subarray(2, ());
    let level2 = level1.slice(1, 4);
    let level3 = level2.subarray(-1, ());

    level3.set(0, 7).unwrap();
    assert_eq!(parent.get(5), Some(7));
    parent.set(4, 5).unwrap();
    assert_eq!(level2.get(1), Some(5));
    assert!(level3.shares_store_with(&parent));
    assert_eq!(level3.byte_offset(), 5);
}

#[test]
fn range_arguments_coerce_leniently() {
    let parent = view(&[1, 2, 3, 4, 5]);
    assert_eq!(parent.slice((), ()).len(), 5);
    assert_eq!(parent.slice(-3, -1).to_vec(), vec![3, 4]);
    assert_eq!(parent.slice(f64::NAN, 2).to_vec(), vec![1, 2]);
    assert_eq!(parent.slice(true, "3").to_vec(), vec![2, 3]);
    assert_eq!(parent.slice(f64::NEG_INFINITY, f64::INFINITY).len(), 5);
    assert_eq!(parent.slice(HostValue::Object, 1).to_vec(), vec![1]);
    assert!(parent.slice(4, 2).is_empty());
    assert!(parent.slice(10, ()).is_empty());
}

#[test]
fn slice_of_dispatches_on_receiver() {
    let parent = view(&[1, 2, 3]);
    let derived = ByteView::slice_of(&HostValue::from(&parent), 1, ()).unwrap();
    assert!(derived.shares_store_with(&parent));

    let array = HostValue::Array(vec![HostValue::from(1), HostValue::from(256), HostValue::from(3)]);
    assert_eq!(ByteView::slice_of(&array, 1, ()).unwrap().to_vec(), vec![0, 3]);
    assert!(ByteView::slice_of(&HostValue::from("abc"), 0, ()).unwrap_err().is_type());
}

#[test]
fn index_access_never_extends_the_view() {
    let buf = view(&[0, 0, 0]);
    assert_eq!(buf.get(3), None);
    buf.set(3, 1).unwrap();
    buf.set(0, "0x41").unwrap();
    buf.set(1, 3.9).unwrap();
    buf.set(2, f64::NAN).unwrap();
    assert_eq!(buf.to_vec(), vec![0x41, 3, 0]);
    assert_eq!(buf.len(), 3);
}

#[test]
fn copy_clamps_to_target_and_validates_starts() {
    let source = view(&[1, 2, 3, 4]);
    let target = view(&[0; 3]);
    assert_eq!(source.copy(&target, 1, (), ()).unwrap(), 2);
    assert_eq!(target.to_vec(), vec![0, 1, 2]);
    assert_eq!(source.copy(&target, 5, (), ()).unwrap(), 0);
    assert_eq!(source.copy(&target, 0, 3, 1).unwrap(), 0);
    assert_eq!(source.copy(&target, 0, 2, 99).unwrap(), 2);
    assert_eq!(target.to_vec(), vec![3, 4, 2]);

    assert!(source.copy(&target, -1, (), ()).unwrap_err().is_range());
    assert!(source.copy(&target, 0, 5, ()).unwrap_err().is_range());
    assert!(source.copy(&target, 0, 0, -1).unwrap_err().is_range());
}

#[test]
fn copy_within_one_store_behaves_like_memmove() {
    let buf = view(&[1, 2, 3, 4, 5, 6]);
    let head = buf.subarray(0, 4);
    let tail = buf.subarray(2, ());
    assert_eq!(head.copy(&tail, (), (), ()).unwrap(), 4);
    assert_eq!(buf.to_vec(), vec![1, 2, 1, 2, 3, 4]);
}

#[test]
fn swaps_reverse_each_unit_in_place() {
    let buf = view(&[1, 2, 3, 4, 5, 6, 7, 8]);
    buf.swap64().unwrap();
    assert_eq!(buf.to_vec(), vec![8, 7, 6, 5, 4, 3, 2, 1]);
    buf.swap16().unwrap().swap32().unwrap();
    assert_eq!(buf.to_vec(), vec![5, 6, 7, 8, 1, 2, 3, 4]);
    let err = view(&[1, 2, 3]).swap16().unwrap_err();
    assert!(err.is_range());
    assert_eq!(err.to_string(), "Buffer size must be a multiple of 16-bits");
}

#[test]
fn store_lifetime_tracks_views() {
    let store = ByteStore::new(4).unwrap();
    assert_eq!(store.ref_count(), 1);
    let window = ByteView::from_store(&store, (), ()).unwrap();
    let nested = window.slice(1, ());
    assert_eq!(store.ref_count(), 3);
    drop(window);
    drop(nested);
    assert_eq!(store.ref_count(), 1);
}

#[test]
fn equality_and_ordering_compare_contents() {
    let a = view(&[1, 2, 3]);
    let b = view(&[1, 2, 3]);
    assert_eq!(a, b);
    assert!(!a.shares_store_with(&b));
    assert!(view(&[1, 2]) < a);
    assert!(view(&[0xff]) > a);
    let mut sorted = vec![view(&[2]), view(&[1, 9]), view(&[1])];
    sorted.sort();
    assert_eq!(sorted, vec![view(&[1]), view(&[1, 9]), view(&[2])]);
}

#[test]
fn debug_rendering_and_bytes_interop() {
    let buf = view(&[0xde, 0xad]);
    assert_eq!(format!("{buf:?}"), "<Buffer de ad>");
    let long = ByteView::from(vec![0u8; INSPECT_MAX_BYTES + 1]);
    assert!(format!("{long:?}").ends_with("00 ... 1 more byte>"));

    let bytes = buf.to_bytes();
    assert_eq!(&bytes[..], &[0xde, 0xad]);
    let back = ByteView::from(bytes);
    assert_eq!(back, buf);
}
