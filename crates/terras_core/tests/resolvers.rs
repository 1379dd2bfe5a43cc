use terras_core::db::open_db_in_memory;
use terras_core::model::geo::HOME_COUNTRY_CODE;
use terras_core::repo::community_repo::{CommunityRepository, SqliteCommunityRepository};
use terras_core::repo::geo_repo::{GeoRepository, SqliteGeoRepository};
use terras_core::service::community_resolver::CommunityResolver;
use terras_core::service::location_resolver::{ensure_home_country, LocationResolver};
use terras_core::source::record::LocationFragment;
use terras_core::{NewCommunity, RepoError};

fn fragment(municipality: Option<&str>, state: Option<&str>) -> LocationFragment {
    LocationFragment {
        municipality_name: municipality.map(str::to_string),
        state_code: state.map(str::to_string),
    }
}

#[test]
fn home_country_is_created_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGeoRepository::new(&conn);

    let (first, created_first) = ensure_home_country(&repo).unwrap();
    let (second, created_second) = ensure_home_country(&repo).unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(first.id, second.id);
    assert_eq!(first.code, HOME_COUNTRY_CODE);
    assert_eq!(first.name, "Brazil");
}

#[test]
fn location_resolver_creates_state_and_municipality_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGeoRepository::new(&conn);
    let (country, _) = ensure_home_country(&repo).unwrap();
    let resolver = LocationResolver::new(&repo);

    let (first, created_first) = resolver
        .resolve(&fragment(Some("Fonte Boa"), Some("AM")))
        .unwrap();
    let (second, created_second) = resolver
        .resolve(&fragment(Some("Fonte Boa"), Some("AM")))
        .unwrap();
    let first = first.unwrap();

    assert!(created_first);
    assert!(!created_second);
    assert_eq!(second.unwrap().id, first.id);
    assert_eq!(first.code, "AM");
    assert_eq!(first.name_local, None);

    let state = repo.find_state_by_code("AM").unwrap().unwrap();
    assert_eq!(state.name, "AM");
    assert_eq!(state.country_id, country.id);
    assert_eq!(first.state_id, state.id);
}

#[test]
fn location_resolver_reuses_existing_state_for_new_municipality() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGeoRepository::new(&conn);
    ensure_home_country(&repo).unwrap();
    let resolver = LocationResolver::new(&repo);

    let (fonte_boa, _) = resolver
        .resolve(&fragment(Some("Fonte Boa"), Some("AM")))
        .unwrap();
    let (labrea, created) = resolver
        .resolve(&fragment(Some("Lábrea"), Some("AM")))
        .unwrap();

    assert!(created);
    assert_eq!(
        fonte_boa.unwrap().state_id,
        labrea.as_ref().unwrap().state_id
    );
    assert_eq!(labrea.unwrap().name, "Lábrea");
}

#[test]
fn incomplete_fragment_resolves_to_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGeoRepository::new(&conn);
    ensure_home_country(&repo).unwrap();
    let resolver = LocationResolver::new(&repo);

    for incomplete in [
        fragment(None, Some("AM")),
        fragment(Some("Fonte Boa"), None),
        fragment(Some("  "), Some("AM")),
    ] {
        assert_eq!(resolver.resolve(&incomplete).unwrap(), (None, false));
    }
    assert!(repo.find_state_by_code("AM").unwrap().is_none());
}

#[test]
fn location_resolver_requires_home_country() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGeoRepository::new(&conn);

    let err = LocationResolver::new(&repo)
        .resolve(&fragment(Some("Fonte Boa"), Some("AM")))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "country", .. }));
}

#[test]
fn community_resolver_reuses_spelling_variants() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);
    let resolver = CommunityResolver::new(&repo);

    let (kokama, created) = resolver.resolve("Kokama").unwrap();
    let (variant, variant_created) = resolver.resolve("  KOKAMA ").unwrap();

    assert!(created);
    assert!(!variant_created);
    assert_eq!(kokama.slug, "kokama");
    assert_eq!(variant.id, kokama.id);
    assert_eq!(repo.list_communities().unwrap().len(), 1);
}

#[test]
fn community_resolver_strips_diacritics_from_slug() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);

    let (apurina, _) = CommunityResolver::new(&repo).resolve("Apurinã").unwrap();

    assert_eq!(apurina.name, "Apurinã");
    assert_eq!(apurina.slug, "apurina");
    assert_eq!(repo.find_by_slug("apurina").unwrap().unwrap().id, apurina.id);
}

#[test]
fn community_resolver_rejects_blank_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);

    let err = CommunityResolver::new(&repo).resolve("   ").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn community_resolver_reuses_name_stored_under_another_slug() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);
    let existing = repo
        .create_community(&NewCommunity::with_slug("Guarani", "guarani-mbya"))
        .unwrap();

    let (resolved, created) = CommunityResolver::new(&repo).resolve("Guarani").unwrap();

    assert!(!created);
    assert_eq!(resolved.id, existing.id);
    assert_eq!(resolved.slug, "guarani-mbya");
    assert_eq!(repo.list_communities().unwrap().len(), 1);
}

#[test]
fn derived_slugs_get_numeric_suffixes_on_collision() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);

    let first = repo.create_community(&NewCommunity::new("Apurinã")).unwrap();
    let second = repo.create_community(&NewCommunity::new("Apurina")).unwrap();
    let third = repo.create_community(&NewCommunity::new("APURINA")).unwrap();

    assert_eq!(first.slug, "apurina");
    assert_eq!(second.slug, "apurina-1");
    assert_eq!(third.slug, "apurina-2");
}

#[test]
fn explicit_slug_is_kept_and_collisions_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);

    let created = repo
        .create_community(&NewCommunity::with_slug("Yanomami", "yanomami-rr"))
        .unwrap();
    assert_eq!(created.slug, "yanomami-rr");

    let err = repo
        .create_community(&NewCommunity::with_slug("Ye'kwana", "yanomami-rr"))
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert!(repo.slug_taken("yanomami-rr", None).unwrap());
    assert!(!repo.slug_taken("yanomami-rr", Some(created.id)).unwrap());
}

#[test]
fn name_without_slug_characters_falls_back() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCommunityRepository::new(&conn);

    let resolver = CommunityResolver::new(&repo);

    let (question, created_question) = resolver.resolve("???").unwrap();
    let (bang, created_bang) = resolver.resolve("!!!").unwrap();
    let (again, created_again) = resolver.resolve("???").unwrap();

    assert!(created_question);
    assert!(created_bang);
    assert!(!created_again);
    assert_eq!(question.slug, terras_core::slug::FALLBACK_SLUG);
    assert_eq!(bang.slug, format!("{}-1", terras_core::slug::FALLBACK_SLUG));
    assert_ne!(bang.id, question.id);
    assert_eq!(again.id, question.id);
    assert_eq!(repo.list_communities().unwrap().len(), 2);
}
