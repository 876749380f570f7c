use proptest::prelude::*;
use shared::form::{
    LocationTriple, PostalCode, PostalCodeSource, PotholeForm, StreetSlot,
};
use shared::{DialogId, LocalityId, MunicipalityId, StateId, StreetId};

#[derive(Debug, Clone)]
enum Op {
    State(Option<u64>),
    Municipality(Option<u64>),
    Locality(Option<u64>),
    Street(StreetSlot, Option<u64>),
    Type(String),
    Reverse { locality: u64, code: u32 },
    Forward { code: String, locality: Option<u64> },
}

fn small_id() -> impl Strategy<Value = Option<u64>> {
    prop::option::of(1u64..4)
}

fn op() -> impl Strategy<Value = Op> {
    let slot = prop_oneof![
        Just(StreetSlot::Main),
        Just(StreetSlot::BetweenOne),
        Just(StreetSlot::BetweenTwo),
    ];
    prop_oneof![
        small_id().prop_map(Op::State),
        small_id().prop_map(Op::Municipality),
        small_id().prop_map(Op::Locality),
        (slot, small_id()).prop_map(|(slot, id)| Op::Street(slot, id)),
        "[0-9 a-z-]{0,8}".prop_map(Op::Type),
        (1u64..4, 0u32..99_999).prop_map(|(locality, code)| Op::Reverse { locality, code }),
        ("[0-9]{5}", prop::option::of(1u64..4))
            .prop_map(|(code, locality)| Op::Forward { code, locality }),
    ]
}

fn triple(state: u64, municipality: u64, locality: u64) -> LocationTriple {
    LocationTriple {
        state_id: StateId::new(state),
        municipality_id: MunicipalityId::new(municipality),
        locality_id: LocalityId::new(locality),
    }
}

/// The triple a reverse answer for `locality` would describe, under the
/// current state and municipality (or a fixed one when either is unset).
fn reverse_triple(form: &PotholeForm, locality: u64) -> LocationTriple {
    let location = form.location();
    triple(
        location.state_id().map_or(1, StateId::get),
        location.municipality_id().map_or(1, MunicipalityId::get),
        locality,
    )
}

fn apply(form: &mut PotholeForm, op: &Op) {
    match op {
        Op::State(id) => {
            form.set_state(id.map(StateId::new));
        }
        Op::Municipality(id) => {
            form.set_municipality(id.map(MunicipalityId::new));
        }
        Op::Locality(id) => {
            form.set_locality(id.map(LocalityId::new));
        }
        Op::Street(slot, id) => {
            form.set_street(*slot, id.map(StreetId::new));
        }
        Op::Type(raw) => {
            form.set_postal_code(raw);
        }
        Op::Reverse { locality, code } => {
            let answered = reverse_triple(form, *locality);
            form.apply_reverse_postal(answered, Some(format!("{code:05}")));
        }
        Op::Forward { code, locality } => {
            let candidates: Vec<_> = locality.iter().map(|l| triple(1, 1, *l)).collect();
            form.apply_forward_postal(code, &candidates);
        }
    }
}

proptest! {
    #[test]
    fn cascade_never_leaves_orphans(ops in prop::collection::vec(op(), 0..40)) {
        let (mut form, _) = PotholeForm::create(DialogId::generate());

        for op in &ops {
            let postal_before = form.postal_code().clone();
            let triple_before = form.location().triple();
            apply(&mut form, op);

            let location = form.location();
            if location.municipality_id().is_some() {
                prop_assert!(location.state_id().is_some());
            }
            if location.locality_id().is_some() {
                prop_assert!(location.municipality_id().is_some());
            }
            for slot in [StreetSlot::Main, StreetSlot::BetweenOne, StreetSlot::BetweenTwo] {
                if location.street(slot).is_some() {
                    prop_assert!(location.locality_id().is_some());
                }
            }

            let value = form.postal_code().value();
            prop_assert!(value.len() <= 5);
            prop_assert!(value.chars().all(|c| c.is_ascii_digit()));

            match op {
                Op::State(_) => {
                    prop_assert_eq!(location.municipality_id(), None);
                    prop_assert_eq!(location.locality_id(), None);
                    prop_assert_eq!(form.postal_code(), &PostalCode::UserAuthored(String::new()));
                }
                Op::Type(_) => {
                    prop_assert_eq!(form.postal_code().source(), PostalCodeSource::Manual);
                }
                Op::Reverse { locality, .. } => {
                    if triple_before != Some(reverse_triple(&form, *locality)) {
                        prop_assert_eq!(form.postal_code(), &postal_before);
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn typed_code_is_normalized(raw in "\\PC{0,16}") {
        let (mut form, _) = PotholeForm::create(DialogId::generate());
        let lookups = form.set_postal_code(&raw);

        let digits: String = raw.chars().filter(char::is_ascii_digit).take(5).collect();
        prop_assert_eq!(form.postal_code(), &PostalCode::UserAuthored(digits.clone()));
        prop_assert_eq!(lookups.len(), usize::from(digits.len() == 5));
    }
}
