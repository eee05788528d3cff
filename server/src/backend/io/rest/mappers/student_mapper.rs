use crate::backend::domain::models::student::Student as DomainStudent;
use shared::Student as StudentDto;

/// Maps between the domain student profile and its wire representation
pub struct StudentMapper;

impl StudentMapper {
    pub fn to_dto(student: DomainStudent) -> StudentDto {
        StudentDto {
            student_id: student.student_id,
            name: student.name,
            dob: student.dob.format("%Y-%m-%d").to_string(),
            school_name: student.school_name,
            registered_on: student.registered_on.format("%Y-%m-%d").to_string(),
        }
    }
}
