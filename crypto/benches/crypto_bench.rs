use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ed25519_sign_bench(c: &mut Criterion) {
    let kp = relaymesh_crypto::generate_keypair();
    let msg = [42u8; 128];

    c.bench_function("ed25519_sign_128B", |b| {
        b.iter(|| relaymesh_crypto::sign_message(black_box(&msg), &kp.private))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = relaymesh_crypto::generate_keypair();
    let msg = [42u8; 128];
    let sig = relaymesh_crypto::sign_message(&msg, &kp.private);

    c.bench_function("ed25519_verify_128B", |b| {
        b.iter(|| relaymesh_crypto::verify_signature(black_box(&msg), &sig, &kp.public))
    });
}

fn sha256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("sha256_256B", |b| {
        b.iter(|| relaymesh_crypto::sha256(black_box(&data)))
    });
}

fn sha256_1kb_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 1024];

    c.bench_function("sha256_1KB", |b| {
        b.iter(|| relaymesh_crypto::sha256(black_box(&data)))
    });
}

fn sha256_multi_bench(c: &mut Criterion) {
    let parts: Vec<&[u8]> = vec![&[1u8; 32], &[2u8; 64], &[3u8; 128]];

    c.bench_function("sha256_multi_3parts", |b| {
        b.iter(|| relaymesh_crypto::sha256_multi(black_box(&parts)))
    });
}

fn hash_payload_bench(c: &mut Criterion) {
    let payload = vec![0xFFu8; 512];

    c.bench_function("hash_payload_512B", |b| {
        b.iter(|| relaymesh_crypto::hash_payload(black_box(&payload)))
    });
}

fn keypair_generation_bench(c: &mut Criterion) {
    c.bench_function("keypair_generate", |b| {
        b.iter(|| relaymesh_crypto::generate_keypair())
    });
}

criterion_group!(
    benches,
    ed25519_sign_bench,
    ed25519_verify_bench,
    sha256_bench,
    sha256_1kb_bench,
    sha256_multi_bench,
    hash_payload_bench,
    keypair_generation_bench,
);
criterion_main!(benches);
