use criterion::{black_box, criterion_group, criterion_main, Criterion};
use java2rs_core::{transpile_source, JavaParser, Parser};

const SOURCE: &str = r#"
package bench;

import java.util.List;

public class Inventory {
    private static final int LIMIT = 64;
    private int count;
    private String label = "items";

    public Inventory(int count) {
        this.count = count;
    }

    public int add(int n) throws IllegalStateException {
        if (count + n > LIMIT) {
            throw new IllegalStateException("full");
        }
        count += n;
        return count;
    }

    public String describe() {
        return label + ": " + count + " of " + LIMIT;
    }

    public static int total(int[] values) {
        int sum = 0;
        for (int i = 0; i < values.length; i++) {
            sum += values[i];
        }
        return sum;
    }

    public int classify(int k) {
        switch (k) {
            case 0: return 0;
            case 1: case 2: return 1;
            default: return 2;
        }
    }
}
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_java_unit", |b| {
        let mut parser = JavaParser::new().unwrap();
        b.iter(|| parser.parse(black_box(SOURCE)).unwrap())
    });
}

fn bench_transpile(c: &mut Criterion) {
    c.bench_function("transpile_java_unit", |b| {
        b.iter(|| transpile_source(black_box(SOURCE)).unwrap())
    });
}

criterion_group!(benches, bench_parse, bench_transpile);
criterion_main!(benches);
