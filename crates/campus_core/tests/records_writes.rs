use campus_core::model::course::NewCourse;
use campus_core::model::department::NewDepartment;
use campus_core::model::enrollment::NewEnrollment;
use campus_core::model::instructor::NewInstructor;
use campus_core::model::student::NewStudent;
use campus_core::model::user::{NewUser, UserRole};
use campus_core::repo::course_repo::{CourseRepository, SqliteCourseRepository};
use campus_core::repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
use campus_core::repo::instructor_repo::{InstructorRepository, SqliteInstructorRepository};
use campus_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use campus_core::repo::RepoError;
use campus_core::service::coordinator::{WriteCoordinator, WriteStep, WriteUnit, Written};
use campus_core::service::guard::GuardError;
use campus_core::{
    EntityKind, QueryError, RecordsService, Reference, ReferentialGuard, ServiceError, Store,
    StoreConfig, ValidationError,
};
use chrono::NaiveDate;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn service() -> RecordsService {
    RecordsService::new(Store::open_in_memory(&StoreConfig::default()).unwrap())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_user(first_name: &str, email: &str) -> NewUser {
    NewUser {
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        role: UserRole::Admin,
    }
}

fn new_student(name: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        age: 21,
        grade: 6.0,
        email: format!("{}@uni.edu", name.to_lowercase()),
        address: "2 Side St".to_string(),
        phone: "555-0101".to_string(),
        enrollment_date: date(2023, 9, 1),
        courses: Vec::new(),
    }
}

fn new_instructor() -> NewInstructor {
    NewInstructor {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@uni.edu".to_string(),
        phone_number: "555-0199".to_string(),
        hire_date: date(2019, 2, 1),
    }
}

/// Instructor, department and course; returns `(department_id, course_id)`.
fn seed_catalog(service: &RecordsService) -> (i64, i64) {
    let instructor = service.create_instructor(&new_instructor()).unwrap();
    let department = service
        .create_department(&NewDepartment {
            department_name: "Computing".to_string(),
            department_head: instructor.id,
        })
        .unwrap();
    let course = service
        .create_course(&NewCourse {
            course_name: "Compilers".to_string(),
            course_description: "Parsing and codegen".to_string(),
            credits: 6,
            department_id: department.id,
        })
        .unwrap();
    (department.id, course.id)
}

fn row_count(store: &Store, table: &str) -> i64 {
    let conn = store.acquire().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn guard_reports_existing_and_missing_rows_without_side_effects() {
    let service = service();
    let (department_id, course_id) = seed_catalog(&service);
    let conn = service.store().acquire().unwrap();
    let guard = ReferentialGuard::new(&conn);

    assert!(guard.exists(Reference::course(course_id)).unwrap());
    assert!(guard.exists(Reference::department(department_id)).unwrap());
    assert!(!guard.exists(Reference::student(1)).unwrap());
    // Repeated checks answer the same way.
    assert!(!guard.exists(Reference::student(1)).unwrap());

    match guard
        .verify(&[Reference::course(course_id), Reference::student(5)])
        .unwrap_err()
    {
        GuardError::Missing(reference) => assert_eq!(reference, Reference::student(5)),
        other => panic!("unexpected error: {other:?}"),
    }
    drop(conn);
    assert_eq!(row_count(service.store(), "students"), 0);
}

fn first_missing(guard: &ReferentialGuard<'_>, references: &[Reference]) -> Option<Reference> {
    match guard.verify(references) {
        Ok(()) => None,
        Err(GuardError::Missing(reference)) => Some(reference),
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn repeated_verify_gives_the_same_answer() {
    let service = service();
    let (department_id, course_id) = seed_catalog(&service);
    let conn = service.store().acquire().unwrap();
    let guard = ReferentialGuard::new(&conn);

    let resolving = [
        Reference::department(department_id),
        Reference::course(course_id),
    ];
    let first = first_missing(&guard, &resolving);
    assert_eq!(first, None);
    assert_eq!(first_missing(&guard, &resolving), first);

    let partial = [
        Reference::course(course_id),
        Reference::student(7),
        Reference::department(department_id + 40),
    ];
    let first = first_missing(&guard, &partial);
    assert_eq!(first, Some(Reference::student(7)));
    assert_eq!(first_missing(&guard, &partial), first);
    drop(conn);
    assert_eq!(row_count(service.store(), "students"), 0);
}

#[test]
fn register_user_stores_a_verifiable_hash_not_the_password() {
    let service = service();
    let user = service
        .register_user(&new_user("Anna", "anna@uni.edu"))
        .unwrap();
    assert_eq!(user.role, UserRole::Admin);

    let conn = service.store().acquire().unwrap();
    let hash = SqliteUserRepository::new(&conn)
        .credential_hash(user.id)
        .unwrap()
        .unwrap();
    drop(conn);
    assert_ne!(hash, "correct horse");
    assert!(hash.starts_with("$argon2id$"));

    assert!(service
        .verify_user_password("anna@uni.edu", "correct horse")
        .unwrap());
    assert!(!service.verify_user_password("anna@uni.edu", "wrong").unwrap());
    assert!(matches!(
        service
            .verify_user_password("nobody@uni.edu", "x")
            .unwrap_err(),
        ServiceError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn failing_credential_step_leaves_no_user_row() {
    let service = service();
    let user = new_user("Anna", "anna@uni.edu");

    let unit = WriteUnit::new("register_user")
        .step(WriteStep::new("insert_user", |conn, _| {
            SqliteUserRepository::new(conn)
                .create_user(&user)
                .map(Written::User)
        }))
        .step(WriteStep::new("insert_credential", |_, _| {
            Err(RepoError::InvalidData("credential store offline".to_string()))
        }));

    let err = WriteCoordinator::new(service.store())
        .execute(unit)
        .unwrap_err();
    match err {
        ServiceError::WriteFailed { step, .. } => assert_eq!(step, "insert_credential"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(row_count(service.store(), "users"), 0);
    assert_eq!(row_count(service.store(), "user_credentials"), 0);
}

#[test]
fn not_found_from_a_later_step_rolls_back_earlier_writes() {
    let service = service();
    let user = new_user("Anna", "anna@uni.edu");

    let unit = WriteUnit::new("replace_user")
        .step(WriteStep::new("insert_user", |conn, _| {
            SqliteUserRepository::new(conn)
                .create_user(&user)
                .map(Written::User)
        }))
        .step(WriteStep::new("delete_old_user", |conn, _| {
            SqliteUserRepository::new(conn)
                .delete_user(404)
                .map(Written::User)
        }));

    let err = WriteCoordinator::new(service.store())
        .execute(unit)
        .unwrap_err();
    match err {
        ServiceError::NotFound { kind, key } => {
            assert_eq!(kind, EntityKind::User);
            assert_eq!(key, "404");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(row_count(service.store(), "users"), 0);
}

#[test]
fn duplicate_email_registration_fails_and_writes_nothing() {
    let service = service();
    service
        .register_user(&new_user("Anna", "anna@uni.edu"))
        .unwrap();

    let err = service
        .register_user(&new_user("Other", "anna@uni.edu"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::WriteFailed {
            step: "insert_user",
            ..
        }
    ));
    assert_eq!(row_count(service.store(), "users"), 1);
    assert_eq!(row_count(service.store(), "user_credentials"), 1);
}

#[test]
fn invalid_registration_is_rejected_before_any_write() {
    let service = service();
    let mut user = new_user("Anna", "not-an-email");
    assert!(matches!(
        service.register_user(&user).unwrap_err(),
        ServiceError::Validation(ValidationError::InvalidEmail(_))
    ));

    user.email = "anna@uni.edu".to_string();
    user.password.clear();
    assert!(matches!(
        service.register_user(&user).unwrap_err(),
        ServiceError::Validation(ValidationError::EmptyPassword)
    ));
    assert_eq!(row_count(service.store(), "users"), 0);
}

#[test]
fn enrollment_with_missing_student_is_reference_not_found() {
    let service = service();
    let (_, course_id) = seed_catalog(&service);

    let err = service
        .create_enrollment(&NewEnrollment {
            student_id: 404,
            course_id,
            grade: None,
        })
        .unwrap_err();
    match err {
        ServiceError::ReferenceNotFound(reference) => {
            assert_eq!(reference, Reference::student(404))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(row_count(service.store(), "enrollments"), 0);
}

#[test]
fn enrollment_with_missing_course_is_reference_not_found() {
    let service = service();
    let student = service.create_student(&new_student("Anna")).unwrap();

    let err = service
        .create_enrollment(&NewEnrollment {
            student_id: student.id,
            course_id: 99,
            grade: Some(5.0),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::ReferenceNotFound(Reference {
            kind: EntityKind::Course,
            id: 99
        })
    ));
}

#[test]
fn course_deleted_mid_unit_rolls_back_the_whole_unit() {
    let service = service();
    let (_, course_id) = seed_catalog(&service);
    let student = service.create_student(&new_student("Anna")).unwrap();
    let request = NewEnrollment {
        student_id: student.id,
        course_id,
        grade: None,
    };

    // The references resolve at check time; the course vanishes before the insert.
    let unit = WriteUnit::new("create_enrollment")
        .step(
            WriteStep::new("delete_course", move |conn, _| {
                conn.execute("DELETE FROM courses WHERE course_id = ?1;", [course_id])?;
                Ok(Written::Deleted(Reference::course(course_id)))
            })
            .requires(Reference::student(student.id))
            .requires(Reference::course(course_id)),
        )
        .step(WriteStep::new("insert_enrollment", |conn, _| {
            SqliteEnrollmentRepository::new(conn)
                .create_enrollment(&request)
                .map(Written::Enrollment)
        }));

    let err = WriteCoordinator::new(service.store())
        .execute(unit)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::WriteFailed {
            step: "insert_enrollment",
            ..
        }
    ));
    assert_eq!(row_count(service.store(), "enrollments"), 0);
    // The deletion was rolled back with the rest of the unit.
    assert_eq!(service.get_course(course_id).unwrap().id, course_id);
}

#[test]
fn department_requires_an_existing_head_instructor() {
    let service = service();
    let err = service
        .create_department(&NewDepartment {
            department_name: "Physics".to_string(),
            department_head: 12,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::ReferenceNotFound(Reference {
            kind: EntityKind::Instructor,
            id: 12
        })
    ));
    assert_eq!(row_count(service.store(), "departments"), 0);
}

#[test]
fn course_requires_an_existing_department() {
    let service = service();
    let err = service
        .create_course(&NewCourse {
            course_name: "Optics".to_string(),
            course_description: String::new(),
            credits: 3,
            department_id: 8,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::ReferenceNotFound(Reference {
            kind: EntityKind::Department,
            id: 8
        })
    ));
}

#[test]
fn committed_writes_are_visible_through_lookups() {
    let service = service();
    let (department_id, course_id) = seed_catalog(&service);
    let student = service.create_student(&new_student("Anna")).unwrap();

    let enrollment = service
        .create_enrollment(&NewEnrollment {
            student_id: student.id,
            course_id,
            grade: Some(9.5),
        })
        .unwrap();

    assert_eq!(service.get_enrollment(enrollment.id).unwrap(), enrollment);
    assert_eq!(
        service.enrollments_for_student(student.id).unwrap(),
        vec![enrollment]
    );
    assert_eq!(
        service.courses_for_department(department_id).unwrap().len(),
        1
    );
    assert!(service
        .courses_for_department(department_id + 100)
        .unwrap()
        .is_empty());
    assert_eq!(service.list_students().unwrap(), vec![student]);
    assert_eq!(service.list_instructors().unwrap().len(), 1);
}

#[test]
fn point_lookups_report_not_found_with_kind() {
    let service = service();
    for err in [
        service.get_user(1).unwrap_err(),
        service.get_student(1).unwrap_err(),
        service.get_instructor(1).unwrap_err(),
        service.get_department(1).unwrap_err(),
        service.get_course(1).unwrap_err(),
        service.get_enrollment(1).unwrap_err(),
    ] {
        assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
    }
    assert!(matches!(
        service.get_user_by_email("ghost@uni.edu").unwrap_err(),
        ServiceError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn user_search_and_delete() {
    let service = service();
    let anna = service
        .register_user(&new_user("Anna", "anna@uni.edu"))
        .unwrap();
    service
        .register_user(&new_user("Juan", "juan@uni.edu"))
        .unwrap();

    assert_eq!(service.search_users(Some("an")).unwrap().len(), 2);
    assert!(matches!(
        service.search_users(Some("")).unwrap_err(),
        ServiceError::Query(QueryError::MissingParameter("name"))
    ));
    assert!(matches!(
        service.search_users(None).unwrap_err(),
        ServiceError::Query(QueryError::MissingParameter("name"))
    ));

    assert_eq!(service.delete_user(anna.id).unwrap().id, anna.id);
    assert_eq!(service.list_users().unwrap().len(), 1);
    assert_eq!(row_count(service.store(), "user_credentials"), 1);
    assert!(matches!(
        service.delete_user(anna.id).unwrap_err(),
        ServiceError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn writes_fail_cleanly_when_the_pool_is_exhausted() {
    let config = StoreConfig {
        pool_size: 1,
        acquire_timeout_ms: 20,
        ..StoreConfig::default()
    };
    let service = RecordsService::new(Store::open_in_memory(&config).unwrap());
    let held = service.store().acquire().unwrap();

    assert!(matches!(
        service.create_student(&new_student("Anna")).unwrap_err(),
        ServiceError::StoreUnavailable(_)
    ));
    drop(held);
    assert!(service.create_student(&new_student("Anna")).is_ok());
}

#[test]
fn concurrent_enrollments_for_the_same_pair_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("campus.db"), &StoreConfig::default()).unwrap();
    let service = RecordsService::new(store);
    let (_, course_id) = seed_catalog(&service);
    let student_id = service.create_student(&new_student("Anna")).unwrap().id;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || {
                service
                    .create_enrollment(&NewEnrollment {
                        student_id,
                        course_id,
                        grade: None,
                    })
                    .map(|enrollment| enrollment.id)
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let conn = service.store().acquire().unwrap();
    let course_still_there = SqliteCourseRepository::new(&conn)
        .get_course(course_id)
        .unwrap();
    assert!(course_still_there.is_some());
}

#[test]
fn in_memory_store_waits_for_an_open_write_instead_of_failing() {
    let service = service();
    let (opened_tx, opened_rx) = mpsc::channel();

    let store = service.store().clone();
    let writer = thread::spawn(move || {
        let mut conn = store.acquire().unwrap();
        let tx = conn.begin().unwrap();
        SqliteInstructorRepository::new(&tx)
            .create_instructor(&new_instructor())
            .unwrap();
        opened_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(300));
        tx.commit().unwrap();
    });

    opened_rx.recv().unwrap();
    // Both calls overlap the other connection's open transaction.
    let created = service.create_instructor(&new_instructor()).unwrap();
    let listed = service.list_instructors().unwrap();
    writer.join().unwrap();

    assert!(listed.iter().any(|instructor| instructor.id == created.id));
    assert_eq!(listed.len(), 2);
    assert_eq!(row_count(service.store(), "instructors"), 2);
}
