use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use outline_editor::{MarkdownTree, NodeId, TextEdit};

fn outline(sections: usize) -> String {
    (0..sections)
        .map(|i| format!("# Section {i}\nSome text about [[topic {i}]].\n\n* first\n* second\n\n"))
        .collect()
}

fn last_paragraph(tree: &MarkdownTree) -> NodeId {
    let root = tree.node(tree.root()).unwrap();
    let section = root.last_child().unwrap();
    tree.node(section).unwrap().first_child().unwrap()
}

fn type_sentence(c: &mut Criterion) {
    let source = outline(100);

    c.bench_function("type_sentence_100_sections", |b| {
        b.iter_batched(
            || {
                let tree = MarkdownTree::parse(&source);
                let para = last_paragraph(&tree);
                (tree, para)
            },
            |(mut tree, para)| {
                for (i, ch) in "hello world".chars().enumerate() {
                    let mut scope = tree.edit();
                    scope
                        .edit_content(para, TextEdit::insert(i, ch.to_string()))
                        .unwrap();
                    scope.commit(None, None).unwrap();
                }
                black_box(tree)
            },
            BatchSize::SmallInput,
        )
    });
}

fn undo_coalesced_burst(c: &mut Criterion) {
    let source = outline(100);

    c.bench_function("undo_coalesced_burst", |b| {
        b.iter_batched(
            || {
                let mut tree = MarkdownTree::parse(&source);
                let para = last_paragraph(&tree);
                for i in 0..50 {
                    tree.transact(|t| t.edit_content(para, TextEdit::insert(i, "x")))
                        .unwrap();
                }
                tree
            },
            |mut tree| {
                let root = tree.root();
                black_box(tree.undo(root).unwrap())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, type_sentence, undo_coalesced_burst);
criterion_main!(benches);
