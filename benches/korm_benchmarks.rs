//! Criterion benchmarks for korm_bootstrap

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use korm_bootstrap::migrations::{
    setup_migration_options, EmbeddedScriptsProvider, ScriptInfo, ScriptsProvider,
    DEFAULT_SCRIPTS_DIR,
};
use korm_bootstrap::prelude::*;
use korm_bootstrap::MemoryCache;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Settings Parsing Benchmarks
// ============================================================================

fn bench_settings_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("settings_parsing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("bare_path", |b| {
        b.iter(|| {
            let settings = ConnectionSettings::parse(black_box("/var/lib/app/data.db")).unwrap();
            black_box(settings)
        });
    });

    group.bench_function("korm_keys", |b| {
        b.iter(|| {
            let settings = ConnectionSettings::parse(black_box(
                "Data Source=app.db;Cache=Shared;KormProvider=Microsoft.Data.Sqlite;KormAutoMigrate=true",
            ))
            .unwrap();
            black_box(settings)
        });
    });

    group.bench_function("json", |b| {
        b.iter(|| {
            let settings = ConnectionSettings::from_json(black_box(
                r#"{"connectionString": "app.db", "provider": "sqlite", "autoMigrate": true}"#,
            ))
            .unwrap();
            black_box(settings)
        });
    });

    group.finish();
}

// ============================================================================
// Builder Benchmarks
// ============================================================================

fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");
    let settings = ConnectionSettings::new("app.db", DatabaseType::Sqlite, true).unwrap();

    group.bench_function("add_korm_migrations", |b| {
        b.iter(|| {
            let mut services = ServiceCollection::new();
            let mut builder = services.add_korm(settings.clone()).unwrap();
            builder.add_korm_migrations();
            black_box(services.len())
        });
    });

    group.bench_function("migrate_disabled", |b| {
        let disabled = ConnectionSettings::new("app.db", DatabaseType::Sqlite, false).unwrap();
        let mut services = ServiceCollection::new();
        let mut builder = services.add_korm(disabled).unwrap();
        builder.add_korm_migrations();
        b.iter(|| black_box(builder.migrate()).unwrap());
    });

    group.bench_function("resolve_runner", |b| {
        let mut services = ServiceCollection::new();
        services.add_korm(settings.clone()).unwrap().add_korm_migrations();
        let provider = services.build_service_provider();
        b.iter(|| {
            let runner = provider.get::<Arc<dyn MigrationsRunner>>().unwrap();
            black_box(runner)
        });
    });

    group.finish();
}

// ============================================================================
// Migration Script Benchmarks
// ============================================================================

fn bench_scripts(c: &mut Criterion) {
    let mut group = c.benchmark_group("scripts");

    group.bench_function("parse_file_name", |b| {
        b.iter(|| {
            let info = ScriptInfo::from_file_name(black_box("20240115001_CreatePeople.sql"));
            black_box(info)
        });
    });

    group.bench_function("default_options", |b| {
        b.iter(|| {
            let options = setup_migration_options(None, Path::new(DEFAULT_SCRIPTS_DIR));
            black_box(options)
        });
    });

    for count in [10usize, 100, 1000] {
        let provider = (0..count).fold(EmbeddedScriptsProvider::new("bench"), |provider, i| {
            provider.with_script(format!("{:05}_Script{}.sql", i, i), "SELECT 1;")
        });

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("list_embedded", count), &provider, |b, provider| {
            b.iter(|| {
                let scripts = tokio_test::block_on(provider.scripts()).unwrap();
                black_box(scripts)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Memory Cache Benchmarks
// ============================================================================

fn bench_memory_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_cache");
    group.throughput(Throughput::Elements(1));

    let cache = MemoryCache::new();
    cache.set("__KormMigrationsHistory:app.db", true);

    group.bench_function("contains_hit", |b| {
        b.iter(|| black_box(cache.contains(black_box("__KormMigrationsHistory:app.db"))));
    });

    group.bench_function("contains_miss", |b| {
        b.iter(|| black_box(cache.contains(black_box("__KormMigrationsHistory:other.db"))));
    });

    group.bench_function("set", |b| {
        b.iter(|| cache.set(black_box("key"), black_box(42i64)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_settings_parsing,
    bench_builder,
    bench_scripts,
    bench_memory_cache
);

criterion_main!(benches);
