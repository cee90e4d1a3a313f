use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn build_table(entries: usize) -> loctab_stf::StringTable {
    loctab_stf::StringTable::from_records(
        0x0000_0102,
        (0..entries).map(|i| {
            (
                format!("string_id_{i:06}"),
                format!("Localized text number {i} with some padding"),
            )
        }),
    )
}

pub mod read {
    use divan::Bencher;
    use loctab_stf::StringTable;
    use std::io::Cursor;

    fn get_input() -> Vec<u8> {
        std::fs::read(format!(
            "{}/resources/sample.stf",
            env!("CARGO_MANIFEST_DIR")
        ))
        .unwrap()
    }

    #[divan::bench]
    fn load_sample(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(StringTable::load(Cursor::new(data)).unwrap());
        });
    }

    #[divan::bench(args = [100, 10_000])]
    fn load(bencher: Bencher, entries: usize) {
        let mut data = Vec::new();
        super::build_table(entries).save(&mut data).unwrap();

        bencher.bench_local(|| {
            divan::black_box(StringTable::load(data.as_slice()).unwrap());
        });
    }
}

pub mod write {
    use divan::Bencher;
    use loctab_stf::options::TableOptions;

    #[divan::bench(args = [100, 10_000])]
    fn save(bencher: Bencher, entries: usize) {
        let table = super::build_table(entries);

        bencher.bench_local(|| {
            let mut buffer = Vec::new();
            table.save(&mut buffer).unwrap();
            divan::black_box(buffer);
        });
    }

    #[divan::bench(sample_count = 10)]
    fn save_fastest(bencher: Bencher) {
        let table = super::build_table(10_000);
        let options = TableOptions::builder().compression_level(1).build();

        bencher.bench_local(|| {
            let mut buffer = Vec::new();
            table.save_with(&mut buffer, &options).unwrap();
            divan::black_box(buffer);
        });
    }
}
