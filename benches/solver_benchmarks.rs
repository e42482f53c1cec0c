use criterion::{black_box, criterion_group, criterion_main, Criterion};
use zebra_csp::puzzle::{parse_puzzle, PuzzleRecord};
use zebra_csp::solver::solve_with;
use zebra_csp::trace::Tracer;

fn record(id: &str, size: &str, puzzle: &str) -> PuzzleRecord {
    PuzzleRecord {
        id: Some(id.to_string()),
        size: Some(size.to_string()),
        puzzle: puzzle.to_string(),
        solution: None,
    }
}

fn simple_3x3() -> PuzzleRecord {
    record(
        "simple-3x3",
        "3*3",
        "\
Colors: orange, blue, green.
Pets: cat, turtle, dog.

Clues:
1. Alice lives in house 3.
2. House 1 is painted orange.
3. The orange house contains the turtle.
4. Mallory lives in the blue house.
5. The green house contains the dog.
",
    )
}

fn zebra_5x3() -> PuzzleRecord {
    record(
        "zebra-5x3",
        "5*3",
        "\
There are 5 houses, numbered 1 to 5 from left to right.

Names: Alice, Bob, Carol, Dave, Erin.
Colors: red, blue, green, yellow, white.
Pets: dog, cat, turtle, fish, bird.

Clues:
1. Alice lives in house 1.
2. The red house is immediately to the left of the blue house.
3. The green house is to the left of the white house.
4. Bob lives in the yellow house.
5. The dog belongs to Carol.
6. There are two houses between Alice and the fish.
7. Dave lives next to the turtle.
",
    )
}

fn bench_parse(c: &mut Criterion) {
    let puzzle = zebra_5x3();
    c.bench_function("parse_zebra_5x3", |b| {
        b.iter(|| black_box(parse_puzzle(&puzzle).unwrap()))
    });
}

fn bench_solve(c: &mut Criterion) {
    let small = parse_puzzle(&simple_3x3()).unwrap();
    c.bench_function("solve_simple_3x3", |b| {
        b.iter(|| {
            let mut tracer = Tracer::new(false);
            black_box(solve_with(&small, &mut tracer))
        })
    });

    let large = parse_puzzle(&zebra_5x3()).unwrap();
    c.bench_function("solve_zebra_5x3", |b| {
        b.iter(|| {
            let mut tracer = Tracer::new(false);
            black_box(solve_with(&large, &mut tracer))
        })
    });
}

criterion_group!(benches, bench_parse, bench_solve);
criterion_main!(benches);
