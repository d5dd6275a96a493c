// Determinism and independence of program generation.
//
// These tests verify that the generator produces byte-identical outputs
// for identical seeds and configurations, and that sequential
// generations from one generator instance share no state beyond the
// advancing random stream.

use scg::config::GenConfig;
use scg::generate::{GeneratedProgram, Generator, ShaderKind};

fn generate(seed: u64, config: GenConfig) -> GeneratedProgram {
    Generator::new(seed, config)
        .generate(ShaderKind::Compute)
        .expect("generation with a valid configuration must succeed")
}

/// Same seed + same configuration produce byte-identical output.
#[test]
fn same_seed_same_config_identical_output() {
    for seed in [0, 1, 42, 0xdead_beef] {
        let first = generate(seed, GenConfig::default());
        let second = generate(seed, GenConfig::default());
        assert_eq!(
            first.glsl, second.glsl,
            "GLSL output should be byte-identical across runs"
        );
        assert_eq!(
            first.harness, second.harness,
            "harness output should be byte-identical across runs"
        );
        assert_eq!(first.provenance.shader_hash, second.provenance.shader_hash);
    }
}

/// Different seeds produce different programs.
#[test]
fn different_seeds_different_programs() {
    let first = generate(3, GenConfig::default());
    let second = generate(4, GenConfig::default());
    assert_ne!(first.glsl, second.glsl);
    assert_ne!(first.provenance.shader_hash, second.provenance.shader_hash);
}

/// Two sequential generations from one instance never share a buffer,
/// by name or by name+binding pair.
#[test]
fn sequential_generations_share_no_buffers() {
    let mut generator = Generator::new(17, GenConfig::default());
    let first = generator.generate(ShaderKind::Compute).unwrap();
    let second = generator.generate(ShaderKind::Compute).unwrap();

    for a in &first.state.buffers {
        for b in &second.state.buffers {
            assert_ne!(a.name, b.name, "buffer names must be disjoint across runs");
            assert!(
                !(a.name == b.name && a.binding == b.binding),
                "no name+binding pair may repeat"
            );
        }
    }
}

/// Each run starts from a fresh Program State: binding indices restart
/// at zero and per-program name counters restart too.
#[test]
fn each_run_starts_from_a_fresh_state() {
    let mut generator = Generator::new(23, GenConfig::default());
    let first = generator.generate(ShaderKind::Compute).unwrap();
    let second = generator.generate(ShaderKind::Compute).unwrap();

    assert_eq!(first.state.buffers[0].binding, 0);
    assert_eq!(second.state.buffers[0].binding, 0);
    assert_eq!(first.state.buffers[0].member_names[0], "m0");
    assert_eq!(second.state.buffers[0].member_names[0], "m0");
}

/// The configuration fingerprint distinguishes configurations; the
/// shader hash distinguishes programs.
#[test]
fn provenance_separates_config_from_program() {
    let small = GenConfig {
        max_statements: 2,
        ..GenConfig::default()
    };
    let first = generate(5, GenConfig::default());
    let second = generate(5, small);
    assert_ne!(
        first.provenance.config_fingerprint,
        second.provenance.config_fingerprint
    );

    let third = generate(6, GenConfig::default());
    assert_eq!(
        first.provenance.config_fingerprint,
        third.provenance.config_fingerprint
    );
    assert_ne!(first.provenance.shader_hash, third.provenance.shader_hash);
}

/// Generation under a restrictive configuration still terminates and
/// produces a well-formed program (bounded, finite pass).
#[test]
fn restrictive_configurations_terminate() {
    let config = GenConfig {
        max_input_buffers: 1,
        max_output_buffers: 1,
        max_members_per_buffer: 1,
        max_globals: 0,
        max_statements: 0,
        max_expr_depth: 0,
        ..GenConfig::default()
    };
    let program = generate(1, config);
    // Even with zero random statements, every output buffer receives its
    // guaranteed store.
    assert!(program.glsl.contains("void main()"));
    assert!(!program.state.main_body.is_empty());
}
