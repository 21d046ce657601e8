//! Filter parser benchmarks using divan

use octofhir_schema::ast::AllowSigns;
use octofhir_schema::{parse_field_path, parse_filter};

fn main() {
    divan::main();
}

// === Single Comparison Benchmarks ===

mod comparisons {
    use super::*;

    #[divan::bench]
    fn integer(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_filter(divan::black_box("id = 1")));
    }

    #[divan::bench]
    fn escaped_string(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_filter(divan::black_box(r"name = 'O\'Brien'")));
    }

    #[divan::bench]
    fn datetime(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_filter(divan::black_box("created >= 2024-03-15T10:30:00.123Z")));
    }

    #[divan::bench]
    fn array(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_filter(divan::black_box("status in ['open', 'pending', 'closed', 1, 2.5]")));
    }
}

// === Logical Expression Benchmarks ===

mod logical {
    use super::*;

    #[divan::bench]
    fn precedence(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_filter(divan::black_box("a = 1 or b = 2 and c = 3")));
    }

    #[divan::bench]
    fn nested(bencher: divan::Bencher) {
        bencher.bench_local(|| {
            parse_filter(divan::black_box(
                "not (a.b = 1 and (c like 'x%' or d !in [1, 2, 3])) or lower(e) = @user and f != null",
            ))
        });
    }

    #[divan::bench(args = [4, 16, 64])]
    fn chain(bencher: divan::Bencher, terms: usize) {
        let text = (0..terms)
            .map(|i| format!("field{i} = {i}"))
            .collect::<Vec<_>>()
            .join(" and ");
        bencher.bench_local(|| parse_filter(divan::black_box(&text)));
    }
}

// === Field Path Benchmarks ===

mod field_paths {
    use super::*;

    #[divan::bench]
    fn signed(bencher: divan::Bencher) {
        bencher.bench_local(|| parse_field_path(divan::black_box("-address.city.name"), AllowSigns::First));
    }
}
