use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod fake_driver;

/// Helper function to write a setup script into a test directory
pub fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// The seed used by the end to end tests: five diagnoses, three categories and
/// a handful of members, split with batch separators.
pub const DIAGNOSIS_SEED: &str = "\
CREATE TABLE Member (\r
\tMemberID INT PRIMARY KEY,\r
\tFirstName VARCHAR(50) NOT NULL,\r
\tLastName VARCHAR(50) NOT NULL\r
);\r
GO\r
CREATE TABLE Diagnosis (\r
\tDiagnosisID INT PRIMARY KEY,\r
\tDiagnosisDescription VARCHAR(100) NOT NULL\r
);\r
GO\r
CREATE TABLE DiagnosisCategory (\r
\tDiagnosisCategoryID INT PRIMARY KEY,\r
\tCategoryDescription VARCHAR(100) NOT NULL,\r
\tCategoryScore INT NOT NULL\r
);\r
GO\r
CREATE TABLE DiagnosisCategoryMap (\r
\tDiagnosisCategoryID INT NOT NULL,\r
\tDiagnosisID INT NOT NULL\r
);\r
GO\r
CREATE TABLE MemberDiagnosis (\r
\tMemberID INT NOT NULL,\r
\tDiagnosisID INT NOT NULL\r
);\r
GO\r
-- members\r
INSERT INTO Member (MemberID, FirstName, LastName) VALUES (1, 'John', 'Smith');\r
INSERT INTO Member (MemberID, FirstName, LastName) VALUES (2, 'Jack', 'Smith');\r
INSERT INTO Member (MemberID, FirstName, LastName) VALUES (3, 'Will', 'Smyth');\r
GO\r
INSERT INTO Diagnosis (DiagnosisID, DiagnosisDescription) VALUES (1, 'Test Diagnosis 1');\r
INSERT INTO Diagnosis (DiagnosisID, DiagnosisDescription) VALUES (2, 'Test Diagnosis 2');\r
INSERT INTO Diagnosis (DiagnosisID, DiagnosisDescription) VALUES (3, 'Test Diagnosis 3');\r
INSERT INTO Diagnosis (DiagnosisID, DiagnosisDescription) VALUES (4, 'Test Diagnosis 4');\r
INSERT INTO Diagnosis (DiagnosisID, DiagnosisDescription) VALUES (5, 'Test Diagnosis 5');\r
GO\r
INSERT INTO DiagnosisCategory (DiagnosisCategoryID, CategoryDescription, CategoryScore) VALUES (1, 'Category A', 10);\r
INSERT INTO DiagnosisCategory (DiagnosisCategoryID, CategoryDescription, CategoryScore) VALUES (2, 'Category B', 20);\r
INSERT INTO DiagnosisCategory (DiagnosisCategoryID, CategoryDescription, CategoryScore) VALUES (3, 'Category C', 30);\r
GO\r
INSERT INTO DiagnosisCategoryMap (DiagnosisCategoryID, DiagnosisID) VALUES (1, 1);\r
INSERT INTO DiagnosisCategoryMap (DiagnosisCategoryID, DiagnosisID) VALUES (2, 2);\r
INSERT INTO DiagnosisCategoryMap (DiagnosisCategoryID, DiagnosisID) VALUES (3, 3);\r
GO\r
INSERT INTO MemberDiagnosis (MemberID, DiagnosisID) VALUES (1, 2);\r
INSERT INTO MemberDiagnosis (MemberID, DiagnosisID) VALUES (3, 3);\r
GO\r
";
