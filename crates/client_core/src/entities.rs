//! Backend endpoints and search/status vocabulary for every console screen.

use std::sync::Arc;

use chrono::{Datelike, Local};
use shared::domain::{
    status, Course, CourseDraft, Debtor, Group, GroupDraft, IdKind, PaymentDraft, ResourceId,
    StaffDraft, StaffMember, Student, StudentDraft, Teacher, TeacherDraft,
};

use crate::{
    resource::{ActionKind, Endpoint, Resource, ResourceConfig, ResourceController},
    transport::AuthenticatedClient,
};

const PERSON_FIELDS: &[&str] = &["first_name", "last_name", "email"];
const STAFF_STATUSES: &[&str] = &[status::ACTIVE, status::ON_LEAVE, status::INACTIVE];
const LEAVE_STATUSES: &[&str] = &[status::ACTIVE, status::ON_LEAVE];

pub type StaffController = ResourceController<StaffMember>;
pub type TeacherController = ResourceController<Teacher>;
pub type StudentController = ResourceController<Student>;
pub type GroupController = ResourceController<Group>;
pub type CourseController = ResourceController<Course>;
pub type DebtorController = ResourceController<Debtor>;

impl Resource for StaffMember {
    type Draft = StaffDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            "email" => self.email.as_deref(),
            "role" => self.role.as_deref(),
            _ => None,
        }
    }
}

impl Resource for Teacher {
    type Draft = TeacherDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            "email" => self.email.as_deref(),
            "phone" => self.phone.as_deref(),
            _ => None,
        }
    }
}

impl Resource for Student {
    type Draft = StudentDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            "email" => self.email.as_deref(),
            "phone" => self.phone.as_deref(),
            _ => None,
        }
    }
}

impl Resource for Group {
    type Draft = GroupDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        None
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => self.name.as_deref(),
            "teacher_name" => self.teacher_name.as_deref(),
            "course_name" => self.course_name.as_deref(),
            _ => None,
        }
    }
}

impl Resource for Course {
    type Draft = CourseDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => self.name.as_deref(),
            "duration" => self.duration.as_deref(),
            _ => None,
        }
    }
}

impl Resource for Debtor {
    type Draft = PaymentDraft;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn status(&self) -> Option<&str> {
        None
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            "phone" => self.phone.as_deref(),
            _ => None,
        }
    }
}

pub fn admins() -> ResourceConfig {
    ResourceConfig {
        name: "admins",
        id_kind: IdKind::Numeric,
        list: Endpoint::get("/api/staff/all-admins"),
        plural_key: Some("admins"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/staff/create-admin")),
        update: Some(Endpoint::post("/api/staff/edited-admin")),
        remove: Some(Endpoint::delete("/api/staff/deleted-admin")),
        actions: vec![(
            ActionKind::Leave,
            Endpoint::post("/api/staff/leave-staff").with_id_key("staff_id"),
        )],
        search_fields: PERSON_FIELDS,
        statuses: STAFF_STATUSES,
    }
}

/// Managers live on the staff endpoints and share the staff deletion route with admins.
pub fn managers() -> ResourceConfig {
    ResourceConfig {
        name: "managers",
        id_kind: IdKind::Numeric,
        list: Endpoint::get("/api/staff/all-managers"),
        plural_key: Some("managers"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/staff/create-manager")),
        update: Some(Endpoint::post("/api/staff/edited-manager")),
        remove: Some(Endpoint::delete("/api/staff/deleted-admin")),
        actions: vec![(
            ActionKind::Leave,
            Endpoint::post("/api/staff/leave-staff").with_id_key("staff_id"),
        )],
        search_fields: PERSON_FIELDS,
        statuses: STAFF_STATUSES,
    }
}

pub fn teachers() -> ResourceConfig {
    ResourceConfig {
        name: "teachers",
        id_kind: IdKind::Numeric,
        list: Endpoint::get("/api/teacher/get-all-teachers"),
        plural_key: Some("teachers"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/teacher/create-teacher")),
        update: None,
        remove: Some(Endpoint::delete("/api/teacher/fire-teacher")),
        actions: vec![
            (ActionKind::Fire, Endpoint::delete("/api/teacher/fire-teacher")),
            (ActionKind::Return, Endpoint::post("/api/teacher/return-teacher")),
            (ActionKind::Rehire, Endpoint::post("/api/teacher/return-teacher")),
        ],
        search_fields: PERSON_FIELDS,
        statuses: LEAVE_STATUSES,
    }
}

pub fn students() -> ResourceConfig {
    ResourceConfig {
        name: "students",
        id_kind: IdKind::Numeric,
        list: Endpoint::get("/api/student/get-all-students"),
        plural_key: Some("students"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/student/create-student")),
        update: None,
        remove: Some(Endpoint::delete("/api/student/delete-student")),
        actions: vec![
            (
                ActionKind::Leave,
                Endpoint::post("/api/student/leave-student").with_id_key("student_id"),
            ),
            (
                ActionKind::Return,
                Endpoint::post("/api/student/return-student").with_id_key("student_id"),
            ),
        ],
        search_fields: PERSON_FIELDS,
        statuses: LEAVE_STATUSES,
    }
}

pub fn groups() -> ResourceConfig {
    ResourceConfig {
        name: "groups",
        id_kind: IdKind::Text,
        list: Endpoint::get("/api/group/get-all-group"),
        plural_key: Some("groups"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/group/create-group")),
        update: None,
        remove: Some(Endpoint::delete("/api/group/end-group")),
        actions: vec![(
            ActionKind::SetEndDate,
            Endpoint::put("/api/group/edit-end-group").requiring(&["end_date"]),
        )],
        search_fields: &["name", "teacher_name", "course_name"],
        statuses: &[],
    }
}

pub fn courses() -> ResourceConfig {
    ResourceConfig {
        name: "courses",
        id_kind: IdKind::Text,
        list: Endpoint::get("/api/course/get-courses"),
        plural_key: Some("courses"),
        list_query: Vec::new(),
        create: Some(Endpoint::post("/api/course/create-course")),
        update: Some(Endpoint::post("/api/course/edit-course")),
        remove: Some(Endpoint::delete("/api/course/delete-course")),
        actions: vec![
            (ActionKind::Freeze, Endpoint::put("/api/course/freeze-course")),
            (ActionKind::Unfreeze, Endpoint::put("/api/course/unfreeze-course")),
        ],
        search_fields: &["name"],
        statuses: &[status::ACTIVE, status::FROZEN],
    }
}

/// The payments screen lists the month's debtors and records payments against them.
pub fn payments(month: &str) -> ResourceConfig {
    ResourceConfig {
        name: "payments",
        id_kind: IdKind::Text,
        list: Endpoint::get("/api/payment/get-debtors-student"),
        plural_key: Some("debtors"),
        list_query: vec![("month".to_string(), month.to_string())],
        create: Some(Endpoint::post("/api/payment/payment-student")),
        update: None,
        remove: None,
        actions: Vec::new(),
        search_fields: &["first_name", "last_name", "phone"],
        statuses: &[],
    }
}

/// `YYYY-MM` of the local calendar month.
pub fn current_month() -> String {
    let today = Local::now().date_naive();
    format!("{}-{:02}", today.year(), today.month())
}

pub fn admin_controller(client: Arc<AuthenticatedClient>) -> StaffController {
    ResourceController::new(client, admins())
}

pub fn manager_controller(client: Arc<AuthenticatedClient>) -> StaffController {
    ResourceController::new(client, managers())
}

pub fn teacher_controller(client: Arc<AuthenticatedClient>) -> TeacherController {
    ResourceController::new(client, teachers())
}

pub fn student_controller(client: Arc<AuthenticatedClient>) -> StudentController {
    ResourceController::new(client, students())
}

pub fn group_controller(client: Arc<AuthenticatedClient>) -> GroupController {
    ResourceController::new(client, groups())
}

pub fn course_controller(client: Arc<AuthenticatedClient>) -> CourseController {
    ResourceController::new(client, courses())
}

pub fn debtor_controller(client: Arc<AuthenticatedClient>, month: &str) -> DebtorController {
    ResourceController::new(client, payments(month))
}
