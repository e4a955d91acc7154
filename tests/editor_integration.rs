//! End-to-end tests of the filenode editor against files on disk.

use std::path::{Path, PathBuf};

use filenode_editor::catalog::TypeCatalog;
use filenode_editor::editor::{
    ErrorKind, FilenodeEditor, ItemContents, ItemView, PageListing, StagedCopy,
};
use filenode_editor::format::{FieldText, ValueFormatter};
use filenode_editor::heap::{HeapPage, ItemId, ItemStatus, PAGE_HEADER_SIZE, PageHeader};
use filenode_editor::storage::{FileStorage, PAGE_SIZE};
use filenode_editor::tuple::{TupleCodec, TypedTuple};
use filenode_editor::tx::{CommandId, Infomask, TUPLE_HEADER_SIZE, TransactionId, TupleHeader};
use tempfile::{TempDir, tempdir};

const PEOPLE: &str = "id,int4,4,i; flag,bool,1,c; score,float8,8,d; name,text,-1,i; label,name,64,c";

fn text(s: &str) -> FieldText {
    FieldText::Text(s.to_string())
}

fn person(id: i64, flag: bool, score: f64, name: &str, label: &str) -> Vec<FieldText> {
    vec![
        FieldText::Int(id),
        FieldText::Bool(flag),
        FieldText::Float(score),
        text(name),
        text(label),
    ]
}

fn encode_row(catalog: &TypeCatalog, fields: &[FieldText]) -> Vec<u8> {
    let values = ValueFormatter::parse_all(catalog, fields).unwrap();
    let header = TupleHeader::new_insert(TransactionId::new(742), CommandId::FIRST, catalog.len() as u16);
    TupleCodec::new(catalog)
        .encode(&TypedTuple::new(header, values))
        .unwrap()
}

fn heap_page(tuples: &[Vec<u8>]) -> Vec<u8> {
    let mut data = vec![0u8; PAGE_SIZE];
    let mut page = HeapPage::new(&mut data);
    page.init();
    for tuple in tuples {
        page.insert(tuple).unwrap();
    }
    data
}

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    fn new(pages: &[Vec<u8>]) -> Self {
        let dir = tempdir().unwrap();
        let path = dir.path().join("16384");
        std::fs::write(&path, pages.concat()).unwrap();
        Self { _dir: dir, path }
    }

    fn people() -> Self {
        let catalog = TypeCatalog::from_csv(PEOPLE).unwrap();
        let page = heap_page(&[
            encode_row(&catalog, &person(1, true, 1.5, "alice", "admin")),
            encode_row(&catalog, &person(2, false, -0.25, "bob", "user")),
        ]);
        Self::new(&[page])
    }

    fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap()
    }

    async fn editor(&self, csv: &str) -> FilenodeEditor<FileStorage> {
        open_editor(&self.path, csv).await
    }
}

async fn open_editor(path: &Path, csv: &str) -> FilenodeEditor<FileStorage> {
    FilenodeEditor::open(path)
        .await
        .unwrap()
        .with_catalog(TypeCatalog::from_csv(csv).unwrap())
}

fn field_values(view: &ItemView) -> Vec<FieldText> {
    match &view.contents {
        ItemContents::Typed { fields, .. } => fields.iter().map(|f| f.value.clone()).collect(),
        ItemContents::Raw { .. } => panic!("expected typed contents"),
    }
}

#[tokio::test]
async fn test_list_single_item_page() {
    let mut page = vec![0u8; PAGE_SIZE];
    let mut header = PageHeader::new_heap_page();
    header.lower = 32;
    header.upper = 8150;
    header.write_to(&mut page[..PAGE_HEADER_SIZE]);
    ItemId::normal(8150, 42).write_to(&mut page[24..28]);
    let fixture = Fixture::new(&[page]);

    let editor = FilenodeEditor::open_read_only(&fixture.path).await.unwrap();
    let listings = editor.list(Some(0)).await.unwrap();
    assert_eq!(listings.len(), 1);
    let PageListing::Parsed { header, items, .. } = &listings[0] else {
        panic!("expected parsed page");
    };
    assert_eq!((header.lower, header.upper, header.special), (32, 8150, 8192));

    let normal: Vec<_> = items
        .iter()
        .filter(|item| item.status == ItemStatus::Normal)
        .collect();
    assert_eq!(normal.len(), 1);
    assert_eq!(normal[0].item, 0);
    assert_eq!(normal[0].offset, 8150);
    assert_eq!(normal[0].length, 42);
}

#[tokio::test]
async fn test_typed_read() {
    let fixture = Fixture::people();
    let editor = fixture.editor(PEOPLE).await;

    let view = editor.read(0, 0).await.unwrap();
    assert_eq!(
        field_values(&view),
        person(1, true, 1.5, "alice", "admin")
    );
    assert_eq!(view.header.xmin, 742);
    assert_eq!(view.header.natts, 5);

    let ItemContents::Typed { fields, trailing } = &view.contents else {
        panic!("expected typed contents");
    };
    assert!(trailing.is_none());
    // score is double aligned after int4 + bool
    assert_eq!(fields[2].offset, Some(32));
}

#[tokio::test]
async fn test_same_length_update_touches_only_tuple() {
    let fixture = Fixture::people();
    let before = fixture.bytes();

    let report = {
        let editor = fixture.editor(PEOPLE).await;
        editor
            .update_fields(0, 1, &person(20, true, 9.75, "eve", "root"))
            .await
            .unwrap()
    };

    let after = fixture.bytes();
    assert_eq!(before.len(), after.len());
    let span = report.file_offset as usize..report.file_offset as usize + report.length;
    for (i, (old, new)) in before.iter().zip(&after).enumerate() {
        if !span.contains(&i) {
            assert_eq!(old, new, "byte {i} outside the tuple changed");
        }
    }

    let editor = fixture.editor(PEOPLE).await;
    let view = editor.read(0, 1).await.unwrap();
    assert_eq!(field_values(&view), person(20, true, 9.75, "eve", "root"));
    assert_eq!(view.header.xmin, 742);
    assert_eq!(
        field_values(&editor.read(0, 0).await.unwrap()),
        person(1, true, 1.5, "alice", "admin")
    );
}

#[tokio::test]
async fn test_different_length_update_fails_and_leaves_file() {
    let fixture = Fixture::people();
    let before = fixture.bytes();
    let editor = fixture.editor(PEOPLE).await;

    let longer = editor
        .update_fields(0, 0, &person(1, true, 1.5, "alexandra", "admin"))
        .await
        .unwrap_err();
    assert_eq!(longer.kind(), ErrorKind::SizeMismatch);

    let mut nulled = person(1, true, 1.5, "alice", "admin");
    nulled[3] = FieldText::Null;
    let null = editor.update_fields(0, 0, &nulled).await.unwrap_err();
    assert_eq!(null.kind(), ErrorKind::SizeMismatch);

    assert_eq!(fixture.bytes(), before);
}

#[tokio::test]
async fn test_null_bitmap_decode() {
    let csv = "a,int4,4,i;b,int4,4,i;c,int2,2,s";
    let catalog = TypeCatalog::from_csv(csv).unwrap();
    let row = encode_row(&catalog, &[FieldText::Int(10), FieldText::Null, FieldText::Int(30)]);
    let fixture = Fixture::new(&[heap_page(&[row])]);

    let view = fixture.editor(csv).await.read(0, 0).await.unwrap();
    assert_eq!(view.header.null_bitmap.as_deref(), Some("05"));
    assert_eq!(
        field_values(&view),
        vec![FieldText::Int(10), FieldText::Null, FieldText::Int(30)]
    );

    let ItemContents::Typed { fields, .. } = &view.contents else {
        panic!("expected typed contents");
    };
    // b stores nothing, so c follows a directly
    assert_eq!(fields[0].offset, Some(24));
    assert_eq!(fields[1].offset, None);
    assert_eq!(fields[2].offset, Some(28));
}

#[tokio::test]
async fn test_items_without_storage_are_never_decoded() {
    let catalog = TypeCatalog::from_csv(PEOPLE).unwrap();
    let rows: Vec<_> = (0..4)
        .map(|i| encode_row(&catalog, &person(i, false, 0.0, "x", "y")))
        .collect();
    let mut data = heap_page(&rows);
    {
        let mut page = HeapPage::new(&mut data);
        let dead = page.item_id(1).unwrap();
        page.set_item_id(
            1,
            ItemId {
                status: ItemStatus::Dead,
                ..dead
            },
        )
        .unwrap();
        page.set_item_id(2, ItemId::unused()).unwrap();
        page.set_item_id(3, ItemId::from_word(1 | (2 << 15))).unwrap();
    }
    let fixture = Fixture::new(&[data]);
    let editor = fixture.editor(PEOPLE).await;

    assert!(editor.read(0, 0).await.is_ok());
    for item in 1..=3 {
        let err = editor.read(0, item).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ItemNotFound, "item {item}");
    }
    let err = editor.read(0, 4).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ItemNotFound);

    let listings = editor.list(None).await.unwrap();
    let PageListing::Parsed { items, .. } = &listings[0] else {
        panic!("expected parsed page");
    };
    assert_eq!(items[3].status, ItemStatus::Redirect);
    assert_eq!(items[3].redirect_to, Some(0));
}

#[tokio::test]
async fn test_list_continues_past_corrupt_page() {
    let catalog = TypeCatalog::from_csv(PEOPLE).unwrap();
    let good = heap_page(&[encode_row(&catalog, &person(1, true, 1.0, "a", "b"))]);
    let mut corrupt = good.clone();
    corrupt[12..14].copy_from_slice(&9000u16.to_le_bytes()); // pd_lower past the page
    let fresh = vec![0u8; PAGE_SIZE];
    let mut zero_upper = good.clone();
    zero_upper[14..16].copy_from_slice(&0u16.to_le_bytes()); // pd_upper = 0 on a used page
    let fixture = Fixture::new(&[good, corrupt, fresh, zero_upper]);

    let editor = FilenodeEditor::open_read_only(&fixture.path).await.unwrap();
    let listings = editor.list(None).await.unwrap();
    assert_eq!(listings.len(), 4);
    assert!(matches!(&listings[0], PageListing::Parsed { items, .. } if items.len() == 1));
    assert!(matches!(
        &listings[1],
        PageListing::Failed { page: 1, kind: ErrorKind::MalformedPage, .. }
    ));
    assert!(matches!(
        &listings[2],
        PageListing::Parsed { header, items, .. } if header.is_new && items.is_empty()
    ));
    assert!(matches!(
        &listings[3],
        PageListing::Failed { page: 3, kind: ErrorKind::MalformedPage, .. }
    ));

    let err = editor.read(1, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPage);
    let err = editor.read(3, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPage);
    let err = editor.list(Some(4)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ItemNotFound);
}

/// Tuple with one attribute whose data area is `data`.
fn single_attribute_tuple(data: &[u8]) -> Vec<u8> {
    let mut header = TupleHeader::new_insert(TransactionId::new(500), CommandId::FIRST, 1);
    header.infomask |= Infomask::HASVARWIDTH;
    header.hoff = 24;
    let mut tuple = vec![0u8; 24];
    header.write(&mut tuple[..TUPLE_HEADER_SIZE]);
    tuple.extend_from_slice(data);
    tuple
}

#[tokio::test]
async fn test_decode_failures() {
    // 4-byte compressed header (low bits 0b10), total length 12
    let mut compressed = vec![(12 << 2) | 0b10, 0, 0, 0];
    compressed.extend_from_slice(&[0x55; 8]);
    let page = heap_page(&[
        single_attribute_tuple(&compressed),
        single_attribute_tuple(&[1, 2, 3, 4]),
    ]);
    let fixture = Fixture::new(&[page]);

    let err = fixture.editor("t,text,-1,i").await.read(0, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedVarlena);

    let err = fixture.editor("v,int8,8,d").await.read(0, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AttributeOverrun);

    let err = fixture
        .editor("a,int4,4,i;b,int4,4,i")
        .await
        .read(0, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CatalogMismatch);

    // Raw mode does not look at attribute values
    let raw = FilenodeEditor::open_read_only(&fixture.path).await.unwrap();
    let view = raw.read(0, 0).await.unwrap();
    assert_eq!(
        view.contents,
        ItemContents::Raw {
            data: FieldText::from_bytes(&compressed)
        }
    );
}

#[tokio::test]
async fn test_narrow_catalog_keeps_trailing_attributes() {
    let full = TypeCatalog::from_csv(PEOPLE).unwrap();
    let fixture = Fixture::new(&[heap_page(&[encode_row(
        &full,
        &person(5, true, 2.0, "carol", "ops"),
    )])]);
    let narrow = "id,int4,4,i;flag,bool,1,c";

    let editor = fixture.editor(narrow).await;
    let view = editor.read(0, 0).await.unwrap();
    let ItemContents::Typed { fields, trailing } = &view.contents else {
        panic!("expected typed contents");
    };
    assert_eq!(fields.len(), 2);
    assert!(trailing.is_some());

    editor
        .update_fields(0, 0, &[FieldText::Int(6), FieldText::Bool(false)])
        .await
        .unwrap();

    let wide = fixture.editor(PEOPLE).await.read(0, 0).await.unwrap();
    assert_eq!(field_values(&wide), person(6, false, 2.0, "carol", "ops"));
}

#[tokio::test]
async fn test_raw_updates() {
    let fixture = Fixture::people();
    let editor = FilenodeEditor::open(&fixture.path).await.unwrap();
    let before = fixture.bytes();

    // Writing the stored bytes back is a no-op
    let view = editor.read(0, 0).await.unwrap();
    let tuple = before[view.offset..view.offset + view.length].to_vec();
    editor.raw_update(0, 0, &tuple).await.unwrap();
    assert_eq!(fixture.bytes(), before);

    // Replace the int4 id in the data area, header untouched
    let hoff = view.header.hoff as usize;
    let mut data = tuple[hoff..].to_vec();
    data[..4].copy_from_slice(&99i32.to_le_bytes());
    editor.raw_update_data(0, 0, &data).await.unwrap();

    let typed = fixture.editor(PEOPLE).await;
    assert_eq!(
        field_values(&typed.read(0, 0).await.unwrap()),
        person(99, true, 1.5, "alice", "admin")
    );

    let err = editor.raw_update_data(0, 0, &data[1..]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
}

#[tokio::test]
async fn test_checksum_is_passed_through() {
    let catalog = TypeCatalog::from_csv(PEOPLE).unwrap();
    let mut page = heap_page(&[encode_row(&catalog, &person(1, true, 1.0, "a", "b"))]);
    page[8..10].copy_from_slice(&0xBEEFu16.to_le_bytes());
    let fixture = Fixture::new(&[page]);

    fixture
        .editor(PEOPLE)
        .await
        .update_fields(0, 0, &person(2, false, 3.0, "c", "d"))
        .await
        .unwrap();
    assert_eq!(&fixture.bytes()[8..10], &0xBEEFu16.to_le_bytes());
}

#[tokio::test]
async fn test_edit_copy_leaves_original() {
    let fixture = Fixture::people();
    let original = fixture.bytes();
    let copy = fixture.path.with_extension("new");

    let staged = StagedCopy::stage(&fixture.path, &copy).await.unwrap();
    open_editor(staged.path(), PEOPLE)
        .await
        .update_fields(0, 0, &person(1, false, 1.5, "alice", "admin"))
        .await
        .unwrap();
    assert!(!copy.exists());
    staged.commit().unwrap();

    assert_eq!(fixture.bytes(), original);
    let edited = std::fs::read(&copy).unwrap();
    assert_eq!(edited.len(), original.len());
    assert_ne!(edited, original);
}

#[tokio::test]
async fn test_failed_copy_edit_leaves_no_output() {
    let fixture = Fixture::people();
    let original = fixture.bytes();
    let copy = fixture.path.with_extension("new");

    let staged = StagedCopy::stage(&fixture.path, &copy).await.unwrap();
    let err = open_editor(staged.path(), PEOPLE)
        .await
        .update_fields(0, 0, &person(1, false, 1.5, "alexandra", "admin"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    drop(staged);

    assert!(!copy.exists());
    assert_eq!(fixture.bytes(), original);
}

#[tokio::test]
async fn test_copy_onto_input_is_rejected() {
    let fixture = Fixture::people();
    let original = fixture.bytes();

    let err = StagedCopy::stage(&fixture.path, &fixture.path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(fixture.bytes(), original);
    assert_eq!(original.len(), PAGE_SIZE);
}

#[tokio::test]
async fn test_read_only_editor_rejects_update() {
    let fixture = Fixture::people();
    let before = fixture.bytes();
    let editor = FilenodeEditor::open_read_only(&fixture.path)
        .await
        .unwrap()
        .with_catalog(TypeCatalog::from_csv(PEOPLE).unwrap());

    let err = editor
        .update_fields(0, 0, &person(1, true, 1.5, "alice", "admin"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(fixture.bytes(), before);
}
