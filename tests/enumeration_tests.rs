use rdkit::ROMol;
use rgenum::config::RGroupLabel;
use rgenum::enumeration::{Enumerator, ProductOrder};
use rgenum::inputs::{Core, RGroup};

fn rgroup(label: &str, text: &str) -> RGroup {
    let label = label.parse::<RGroupLabel>().unwrap();
    RGroup::from_text(label, text, "test").unwrap()
}

fn canonical(smiles: &str) -> String {
    ROMol::from_smiles(smiles).unwrap().as_smiles()
}

#[test]
fn test_duplicates_are_dropped_in_first_seen_order() {
    let core = Core::new("[*:1]C[*:2]", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n*CC\n"), rgroup("r2", "*C\n*CC\n")];

    let mut enumerator = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None).unwrap();
    let smiles = enumerator
        .by_ref()
        .map(|p| p.canonical_smiles)
        .collect::<Vec<_>>();

    assert_eq!(smiles, vec!["CCC", "CCCC", "CCCCC"]);

    let stats = enumerator.stats();
    assert_eq!(stats.combinations, 4);
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.unique, 3);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.failed, 0);
    assert!(!stats.limit_reached);
}

#[test]
fn test_aromatic_core() {
    let core = Core::new("[*:1]c1ccccc1", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n*O\n*Cl\n")];

    let smiles = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None)
        .unwrap()
        .map(|p| p.canonical_smiles)
        .collect::<Vec<_>>();

    assert_eq!(smiles, vec!["Cc1ccccc1", "Oc1ccccc1", "Clc1ccccc1"]);
}

#[test]
fn test_products_match_toolkit_canonical_form() {
    let core = Core::new("O=C([*:1])N[*:2]", None).unwrap();
    let rgroups = vec![
        rgroup("r1", "*c1ccccc1\n*C1CC1\n"),
        rgroup("r2", "*CC(=O)O\n*c1ccncc1\n"),
    ];

    let smiles = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None)
        .unwrap()
        .map(|p| p.canonical_smiles)
        .collect::<Vec<_>>();

    let expected = [
        "O=C(c1ccccc1)NCC(=O)O",
        "O=C(c1ccccc1)Nc1ccncc1",
        "O=C(C1CC1)NCC(=O)O",
        "O=C(C1CC1)Nc1ccncc1",
    ]
    .iter()
    .map(|s| canonical(s))
    .collect::<Vec<_>>();

    assert_eq!(smiles, expected);
}

#[test]
fn test_chirality_survives_the_zip() {
    let core = Core::new("[*:1][C@H](F)Cl", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n")];

    let product = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None)
        .unwrap()
        .next()
        .unwrap();

    assert_eq!(product.canonical_smiles, canonical("C[C@H](F)Cl"));
    assert_ne!(product.canonical_smiles, canonical("C[C@@H](F)Cl"));
}

#[test]
fn test_failed_products_are_counted_and_skipped() {
    let core = Core::new("[*:1]C(C)(C)C", None).unwrap();
    let rgroups = vec![rgroup("r1", "*=O\n*C\n")];

    let mut enumerator = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None).unwrap();
    let smiles = enumerator
        .by_ref()
        .map(|p| p.canonical_smiles)
        .collect::<Vec<_>>();

    assert_eq!(smiles, vec!["CC(C)(C)C"]);
    assert_eq!(enumerator.stats().failed, 1);
    assert_eq!(enumerator.stats().unique, 1);
}

#[test]
fn test_limit_stops_early() {
    let core = Core::new("[*:1]C[*:2]", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n*CC\n"), rgroup("r2", "*C\n*CC\n")];

    let mut enumerator =
        Enumerator::new(&core, &rgroups, ProductOrder::Sequential, Some(2)).unwrap();
    let count = enumerator.by_ref().count();

    assert_eq!(count, 2);
    assert!(enumerator.stats().limit_reached);
}

#[test]
fn test_shuffled_order_finds_the_same_products() {
    let core = Core::new("[*:1]C[*:2]", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n*CC\n"), rgroup("r2", "*C\n*CC\n*O\n")];

    let mut sequential = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None)
        .unwrap()
        .map(|p| p.canonical_smiles)
        .collect::<Vec<_>>();
    let mut shuffled = Enumerator::new(
        &core,
        &rgroups,
        ProductOrder::Shuffled { seed: Some(11) },
        None,
    )
    .unwrap()
    .map(|p| p.canonical_smiles)
    .collect::<Vec<_>>();

    sequential.sort();
    shuffled.sort();
    assert_eq!(sequential, shuffled);
}

#[test]
fn test_empty_rgroup_gives_no_products() {
    let core = Core::new("[*:1]C[*:2]", None).unwrap();
    let rgroups = vec![rgroup("r1", "*C\n"), rgroup("r2", "\n\n")];

    let mut enumerator = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None).unwrap();
    assert!(enumerator.next().is_none());
    assert_eq!(enumerator.stats().combinations, 0);
}

#[test]
fn test_product_names_and_core_atoms() {
    let core = Core::new("[*:1]c1ccccc1", Some("benzene".to_string())).unwrap();
    let rgroups = vec![rgroup("r1", "*C methyl\n*O\n")];

    let products = Enumerator::new(&core, &rgroups, ProductOrder::Sequential, None)
        .unwrap()
        .collect::<Vec<_>>();

    assert_eq!(products[0].name, "benzene_r1-methyl");
    assert_eq!(products[1].name, "benzene_r1-2");

    // six ring atoms come from the core, the substituent does not
    let from_core = products[0].core_atoms.iter().flatten().count();
    assert_eq!(from_core, 6);
    assert_eq!(products[0].core_atoms.len(), 7);
    assert_eq!(products[0].fragments[0].1.smiles, "*C");
}
