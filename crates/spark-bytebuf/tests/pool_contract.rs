//! `pool_contract` 集成测试：验证 `BufferAllocator` 在公开 API 下的分配契约。
//!
//! # 测试目标（Why）
//! - 池化分配的别名行为对调用方可观测：同一 Arena 的相邻分配不能互相覆盖；
//! - 尺寸校验必须区分 Range 与 Type 两类错误，调用方据此决定重试还是拒绝；
//! - 池容量是可变配置，修改只影响此后的分配。
//!
//! # 结构安排（How）
//! - 分配路径：池化、清零、专用三种入口与零尺寸边界；
//! - 构造路径：字节、视图、类数组、文本、外部存储区与拼接；
//! - 配置路径：`BufferConfig` 装载与线程默认分配器。

use spark_bytebuf::{
    BufferAllocator, BufferConfig, ByteStore, ByteView, ErrorKind, HostValue, MAX_LENGTH,
};

/// 场景：尺寸为 -1 是 Range 类错误，不可转换的值是 Type 类错误。
#[test]
fn size_validation_splits_range_and_type() {
    let allocator = BufferAllocator::new();
    for entry in [
        allocator.allocate(-1).unwrap_err(),
        allocator.allocate(f64::NAN).unwrap_err(),
        allocator.allocate(2.5).unwrap_err(),
        allocator.allocate((MAX_LENGTH as f64) + 1.0).unwrap_err(),
        allocator.allocate_zeroed(-1, (), None).unwrap_err(),
        allocator.allocate_dedicated(-1).unwrap_err(),
    ] {
        assert_eq!(entry.kind(), ErrorKind::Range, "{entry}");
    }
    for entry in [
        allocator.allocate("8").unwrap_err(),
        allocator.allocate(HostValue::Object).unwrap_err(),
        allocator.allocate(8u64).unwrap_err(),
        allocator.allocate_dedicated(true).unwrap_err(),
    ] {
        assert_eq!(entry.kind(), ErrorKind::Type, "{entry}");
    }
}

/// 零尺寸在三种入口下都返回合法的零长度视图。
#[test]
fn zero_size_yields_valid_empty_views() {
    let allocator = BufferAllocator::new();
    assert!(allocator.allocate(0).unwrap().is_empty());
    assert!(allocator.allocate_zeroed(0, 7, None).unwrap().is_empty());
    assert!(allocator.allocate_dedicated(0).unwrap().is_empty());
}

/// 池隔离：同一 Arena 中的两个分配互不别名。
#[test]
fn pooled_allocations_never_overlap() {
    let allocator = BufferAllocator::new();
    let first = allocator.allocate(100).unwrap();
    let second = allocator.allocate(100).unwrap();
    assert!(first.shares_store_with(&second));
    first.fill(0xaa, (), (), None).unwrap();
    second.fill(0x55, (), (), None).unwrap();
    assert!(first.iter().all(|b| b == 0xaa));
    assert!(second.iter().all(|b| b == 0x55));
    let first_end = first.byte_offset() + first.len();
    assert!(first_end <= second.byte_offset());
}

/// 清零分配独立于池，且支持填充值。
#[test]
fn zeroed_allocation_is_dedicated_and_filled() {
    let allocator = BufferAllocator::new();
    let pooled = allocator.allocate(16).unwrap();
    pooled.fill(1, (), (), None).unwrap();

    let zeroed = allocator.allocate_zeroed(16, (), None).unwrap();
    assert!(!zeroed.shares_store_with(&pooled));
    assert!(zeroed.iter().all(|b| b == 0));

    let filled = allocator.allocate_zeroed(5, "ab", None).unwrap();
    assert_eq!(filled.to_vec(), b"ababa");
    let hex = allocator.allocate_zeroed(4, "0102", Some("hex")).unwrap();
    assert_eq!(hex.to_vec(), vec![1, 2, 1, 2]);
    assert!(
        allocator
            .allocate_zeroed(4, "ab", Some("utf-9"))
            .unwrap_err()
            .is_type()
    );
}

/// 修改池容量只影响此后的分配。
#[test]
fn pool_size_changes_apply_to_future_allocations() {
    let allocator = BufferAllocator::new();
    let before = allocator.allocate(1000).unwrap();
    assert_eq!(before.store().byte_length(), allocator.pool_size());

    allocator.set_pool_size(1024).unwrap();
    let dedicated = allocator.allocate(1000).unwrap();
    assert_eq!(dedicated.store().byte_length(), 1000);
    assert_eq!(before.len(), 1000);
    assert!(allocator.set_pool_size(MAX_LENGTH + 1).unwrap_err().is_range());
}

#[test]
fn copying_constructors_detach_from_source() {
    let allocator = BufferAllocator::new();
    let source = allocator.from_bytes(&[1, 2, 3]).unwrap();
    let copy = allocator.from_view(&source).unwrap();
    copy.set(0, 9).unwrap();
    assert_eq!(source.get(0), Some(1));

    let array = allocator
        .from_array_like(&[HostValue::from(257), HostValue::from("2"), HostValue::from(-1)])
        .unwrap();
    assert_eq!(array.to_vec(), vec![1, 2, 255]);
    assert!(
        allocator
            .from_array_like(&[HostValue::from(1u64)])
            .unwrap_err()
            .is_type()
    );

    let text = allocator.from_string("héllo", Some("latin1")).unwrap();
    assert_eq!(text.to_vec(), vec![b'h', 0xe9, b'l', b'l', b'o']);
    assert!(allocator.from_value(&HostValue::from(3), None).unwrap_err().is_type());
    assert!(allocator.from_value(&HostValue::Null, None).unwrap_err().is_type());
}

#[test]
fn from_store_wraps_external_memory_zero_copy() {
    let allocator = BufferAllocator::new();
    let store = ByteStore::from_vec(vec![0; 8]).unwrap();
    let window = allocator.from_store(&store, 2, 4).unwrap();
    window.write_u16_be(0xbeef, 0).unwrap();
    assert_eq!(&store.to_vec()[2..4], &[0xbe, 0xef]);
    assert!(allocator.from_store(&store, 9, ()).unwrap_err().is_range());
    assert!(allocator.from_store(&store, 4, 5).unwrap_err().is_range());
}

#[test]
fn concat_truncates_and_zero_fills() {
    let allocator = BufferAllocator::new();
    let parts = [
        ByteView::from(vec![1, 2]),
        ByteView::from(vec![3]),
        ByteView::from(vec![4, 5]),
    ];
    assert_eq!(allocator.concat(&parts, ()).unwrap().to_vec(), vec![1, 2, 3, 4, 5]);
    assert_eq!(allocator.concat(&parts, 3).unwrap().to_vec(), vec![1, 2, 3]);
    assert_eq!(allocator.concat(&parts, 7).unwrap().to_vec(), vec![1, 2, 3, 4, 5, 0, 0]);
    assert!(allocator.concat(&[], ()).unwrap().is_empty());
    assert!(allocator.concat(&parts, -1).unwrap_err().is_range());
}

#[test]
fn config_drives_allocator_layout() {
    let config = BufferConfig::from_toml_str("pool_size = 256\npool_alignment = 16").unwrap();
    let allocator = BufferAllocator::with_config(&config).unwrap();
    let first = allocator.allocate(3).unwrap();
    let second = allocator.allocate(3).unwrap();
    assert_eq!(second.byte_offset() - first.byte_offset(), 16);
    assert_eq!(allocator.statistics().arena_capacity, 256);

    let invalid = BufferConfig {
        pool_size: 64,
        pool_alignment: 0,
    };
    assert!(BufferAllocator::with_config(&invalid).unwrap_err().is_range());
}

/// 线程默认分配器：各线程的池容量互不影响。
#[test]
fn thread_default_allocator_is_per_thread() {
    spark_bytebuf::set_pool_size(2048).unwrap();
    assert_eq!(spark_bytebuf::pool_size(), 2048);
    let other = std::thread::spawn(spark_bytebuf::pool_size).join().unwrap();
    assert_eq!(other, spark_bytebuf::DEFAULT_POOL_SIZE);

    let zeroed = spark_bytebuf::alloc(4, 0xff, None).unwrap();
    assert_eq!(zeroed.to_vec(), vec![0xff; 4]);
    assert_eq!(spark_bytebuf::alloc_unsafe(10).unwrap().len(), 10);
    let slow = spark_bytebuf::alloc_unsafe_slow(10).unwrap();
    assert_eq!(slow.store().byte_length(), 10);
}
