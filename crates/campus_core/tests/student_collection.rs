use campus_core::db::open_db_in_memory;
use campus_core::repo::student_repo::SqliteStudentRepository;
use campus_core::{
    CollectionError, IdPolicy, JsonFileStudentStore, MemoryStudentStore, NewStudent, PageRequest,
    QueryError, StudentPatch, StudentQuery, StudentService, StudentServiceError, StudentStore,
    ValidationError,
};
use chrono::NaiveDate;

fn new_student(name: &str, grade: f64, courses: &[&str]) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        age: 20,
        grade,
        email: format!("{}@uni.edu", name.to_lowercase()),
        address: "1 Main St".to_string(),
        phone: "555-0100".to_string(),
        enrollment_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        courses: courses.iter().map(|course| course.to_string()).collect(),
    }
}

fn seeded<S: StudentStore>(store: S) -> StudentService<S> {
    let mut service = StudentService::new(store);
    service.add_student(new_student("Anna", 7.0, &["math"])).unwrap();
    service.add_student(new_student("Bob", 9.0, &["art"])).unwrap();
    service.add_student(new_student("Juan", 7.0, &["math", "art"])).unwrap();
    service
}

#[test]
fn memory_store_crud_through_the_service() {
    let mut service = seeded(MemoryStudentStore::default());

    let anna = service.get_student(1).unwrap();
    assert_eq!(anna.name, "Anna");

    let replaced = service
        .replace_student(1, new_student("Anna Maria", 8.0, &["physics"]))
        .unwrap();
    assert_eq!(replaced.id, 1);
    assert_eq!(replaced.courses, vec!["physics"]);

    let patched = service
        .patch_student(
            2,
            StudentPatch {
                grade: Some(10.0),
                ..StudentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(patched.grade, 10.0);
    assert_eq!(patched.name, "Bob");

    assert_eq!(service.delete_student(3).unwrap().name, "Juan");
    assert_eq!(service.list_students().unwrap().len(), 2);
    assert!(matches!(
        service.get_student(3).unwrap_err(),
        StudentServiceError::NotFound(3)
    ));
}

#[test]
fn invalid_patch_leaves_the_record_untouched() {
    let mut service = seeded(MemoryStudentStore::default());

    let err = service
        .patch_student(
            1,
            StudentPatch {
                age: Some(0),
                ..StudentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StudentServiceError::Validation(ValidationError::AgeOutOfRange(0))
    ));
    assert_eq!(service.get_student(1).unwrap().age, 20);

    assert!(matches!(
        service
            .add_student(new_student("Eve", 10.5, &[]))
            .unwrap_err(),
        StudentServiceError::Validation(ValidationError::GradeOutOfRange(_))
    ));
    assert_eq!(service.list_students().unwrap().len(), 3);
}

#[test]
fn writes_to_unknown_ids_are_not_found() {
    let mut service = seeded(MemoryStudentStore::default());
    assert!(matches!(
        service
            .replace_student(77, new_student("Ghost", 5.0, &[]))
            .unwrap_err(),
        StudentServiceError::NotFound(77)
    ));
    assert!(matches!(
        service.delete_student(77).unwrap_err(),
        StudentServiceError::NotFound(77)
    ));
}

#[test]
fn query_operations_read_the_current_snapshot() {
    let service = seeded(MemoryStudentStore::default());

    let names: Vec<String> = service
        .search_by_name(Some("an"))
        .unwrap()
        .into_iter()
        .map(|student| student.name)
        .collect();
    assert_eq!(names, vec!["Anna", "Juan"]);

    let sorted: Vec<i64> = service
        .sorted_by_grade(Some("asc"))
        .unwrap()
        .iter()
        .map(|student| student.id)
        .collect();
    assert_eq!(sorted, vec![1, 3, 2]);

    assert_eq!(service.filtered_by_course(Some("art")).unwrap().len(), 2);
    assert!(service.filtered_by_course(Some("history")).unwrap().is_empty());
    assert!(matches!(
        service.sorted_by_grade(Some("up")).unwrap_err(),
        StudentServiceError::Query(QueryError::InvalidParameter { .. })
    ));

    let page = service.paginated(PageRequest::new(2, 2)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.pagination.total_pages, 2);

    let query = StudentQuery {
        course: Some("math".to_string()),
        sort_order: Some("desc".to_string()),
        ..StudentQuery::default()
    };
    assert_eq!(service.query(&query).unwrap().len(), 2);
    assert_eq!(
        service
            .query_paged(&query, PageRequest::new(1, 1))
            .unwrap()
            .pagination
            .total_pages,
        2
    );
}

#[test]
fn collection_length_policy_collides_after_delete() {
    let mut service = seeded(MemoryStudentStore::new(IdPolicy::CollectionLength));
    service.delete_student(2).unwrap();

    let added = service.add_student(new_student("Dora", 6.0, &[])).unwrap();
    // len + 1 == 3, which Juan still holds.
    assert_eq!(added.id, 3);
    let ids: Vec<i64> = service
        .list_students()
        .unwrap()
        .iter()
        .map(|student| student.id)
        .collect();
    assert_eq!(ids, vec![1, 3, 3]);
}

#[test]
fn high_water_policy_keeps_ids_unique_after_delete() {
    let mut service = seeded(MemoryStudentStore::new(IdPolicy::HighWaterMark));
    service.delete_student(3).unwrap();

    let added = service.add_student(new_student("Dora", 6.0, &[])).unwrap();
    assert_eq!(added.id, 4);
}

#[test]
fn json_file_store_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.json");

    let service = seeded(JsonFileStudentStore::open(&path, IdPolicy::default()).unwrap());
    let written = service.list_students().unwrap();
    drop(service);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n  {"));
    assert!(raw.contains("\"enrollmentDate\": \"2024-09-01\""));

    let reopened = JsonFileStudentStore::open(&path, IdPolicy::default()).unwrap();
    assert_eq!(reopened.get_all().unwrap(), written);
}

#[test]
fn json_file_store_sees_external_edits_and_keeps_ids_unique() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.json");
    let mut store = JsonFileStudentStore::open(&path, IdPolicy::HighWaterMark).unwrap();
    assert!(store.get_all().unwrap().is_empty());

    let anna = store.append(new_student("Anna", 7.0, &[])).unwrap();
    let mut other = JsonFileStudentStore::open(&path, IdPolicy::HighWaterMark).unwrap();
    other.remove_by_id(anna.id).unwrap();

    assert!(store.get_by_id(anna.id).unwrap().is_none());
    let bob = store.append(new_student("Bob", 8.0, &[])).unwrap();
    assert_ne!(bob.id, anna.id);
}

#[test]
fn malformed_collection_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.json");
    std::fs::write(&path, "{ not an array").unwrap();

    assert!(matches!(
        JsonFileStudentStore::open(&path, IdPolicy::default()).unwrap_err(),
        CollectionError::Json { .. }
    ));
}

#[test]
fn relational_store_honours_the_same_contract() {
    let conn = open_db_in_memory().unwrap();
    let mut service = seeded(SqliteStudentRepository::new(&conn));

    let patched = service
        .patch_student(
            1,
            StudentPatch {
                courses: Some(vec!["math".to_string(), "math".to_string(), "bio".to_string()]),
                ..StudentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(patched.courses, vec!["math", "bio"]);

    service.delete_student(3).unwrap();
    let added = service.add_student(new_student("Dora", 6.0, &[])).unwrap();
    assert_eq!(added.id, 4);
    assert_eq!(service.filtered_by_course(Some("math")).unwrap().len(), 1);
    assert!(matches!(
        service.delete_student(3).unwrap_err(),
        StudentServiceError::NotFound(3)
    ));
}
